//! Validation directives passed into response processors.
//!
//! Each is an enum compared by variant, standing in for the sentinel
//! values the protocol checks are specified with: skipping is always an
//! explicit caller decision, never a silent default.

/// What the ID Token `nonce` claim must look like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NonceCheck {
    /// The claim must be absent (the authorization request carried no
    /// `nonce`).
    #[default]
    ExpectNone,
    /// The claim must be present and equal this value.
    Value(String),
}

/// What the authorization response `state` parameter must look like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StateCheck {
    /// The parameter must be absent.
    #[default]
    ExpectNone,
    /// No assertion is made; the caller takes responsibility.
    Skip,
    /// The parameter must be present and equal this value.
    Value(String),
}

/// What the userinfo `sub` claim must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectCheck {
    /// No assertion is made; the caller takes responsibility.
    Skip,
    /// The claim must equal this value.
    Value(String),
}

/// Whether the elapsed time since end-user authentication is bounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MaxAgeCheck {
    /// `auth_time` is not checked against an upper bound.
    #[default]
    Skip,
    /// `auth_time + max_age` must not be in the past.
    Value(u64),
}
