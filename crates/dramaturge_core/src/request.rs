//! Request and response types for the model boundary.

use crate::Message;
use serde::{Deserialize, Serialize};

/// A generation request: an ordered list of role-tagged messages plus
/// sampling parameters.
///
/// # Examples
///
/// ```
/// use dramaturge_core::{GenerateRequest, Message, Role};
///
/// let request = GenerateRequest {
///     messages: vec![Message::new(Role::User, "Hello!")],
///     max_tokens: Some(4096),
///     temperature: Some(0.0),
///     model: None,
/// };
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier override
    pub model: Option<String>,
}

/// One text completion from the model.
///
/// # Examples
///
/// ```
/// use dramaturge_core::GenerateResponse;
///
/// let response = GenerateResponse {
///     text: "{}".to_string(),
/// };
/// assert_eq!(response.text, "{}");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated completion text
    pub text: String,
}
