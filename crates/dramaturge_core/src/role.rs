//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Role of a message sender at the model boundary.
///
/// # Examples
///
/// ```
/// use dramaturge_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum Role {
    /// System messages provide context and instructions
    System,
    /// User messages carry stage input
    User,
    /// Assistant messages are model responses
    Assistant,
}
