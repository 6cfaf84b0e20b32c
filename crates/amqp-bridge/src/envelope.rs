//! Decoding of the message envelope handed over by the supervisor.
//!
//! The supervisor serialises each broker delivery as a JSON object and
//! base64-encodes it so it survives being passed as a single command-line
//! argument:
//!
//! ```text
//! {"body": "...", "properties": {...}, "delivery_info": {...}}
//! ```
//!
//! `body` and `properties` are required. `delivery_info` may be absent or
//! `null`. Property values are carried through untouched; the bridge never
//! assigns meaning to them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Broker-level message properties, keyed by AMQP property name.
pub type Properties = Map<String, Value>;

/// Errors raised while decoding an encoded envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The argument was not valid standard base64.
    #[error("message is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes were not a JSON object of the expected shape.
    #[error("message is not a valid envelope document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One broker message, decoded from the supervisor's argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    body: Vec<u8>,
    properties: Properties,
    delivery_info: Option<DeliveryInfo>,
}

/// Delivery metadata reported by the broker for a single message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DeliveryInfo(Map<String, Value>);

#[derive(Debug, Deserialize, Serialize)]
struct WireEnvelope {
    body: String,
    properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_info: Option<DeliveryInfo>,
}

impl Envelope {
    /// Creates an envelope from a body and its properties.
    pub fn new(body: impl Into<Vec<u8>>, properties: Properties) -> Self {
        Self {
            body: body.into(),
            properties,
            delivery_info: None,
        }
    }

    /// Attaches delivery metadata to the envelope.
    #[must_use]
    pub fn with_delivery_info(mut self, delivery_info: DeliveryInfo) -> Self {
        self.delivery_info = Some(delivery_info);
        self
    }

    /// Decodes an envelope from its base64 JSON representation.
    ///
    /// Surrounding ASCII whitespace is ignored so a trailing newline added
    /// by a shell wrapper does not poison the message. Anything else outside
    /// the standard alphabet, including missing padding, is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Base64`] when the argument is not base64 and
    /// [`DecodeError::Json`] when the payload is not UTF-8 JSON, is not an
    /// object, or lacks a string `body` or an object `properties`.
    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = STANDARD.decode(encoded.trim_ascii())?;
        let wire: WireEnvelope = serde_json::from_slice(&bytes)?;
        Ok(Self::from_wire(wire))
    }

    /// Encodes the envelope into the representation accepted by [`decode`].
    ///
    /// Bodies that are not valid UTF-8 are converted lossily because the
    /// wire format carries the body as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised while serialising the
    /// document.
    ///
    /// [`decode`]: Self::decode
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let wire = WireEnvelope {
            body: String::from_utf8_lossy(&self.body).into_owned(),
            properties: self.properties.clone(),
            delivery_info: self.delivery_info.clone(),
        };
        let json = serde_json::to_vec(&wire)?;
        Ok(STANDARD.encode(json))
    }

    /// Raw message body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Message body as text, when it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// All message properties, as received.
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Looks up a single property by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Delivery metadata, when the supervisor supplied it.
    pub const fn delivery_info(&self) -> Option<&DeliveryInfo> {
        self.delivery_info.as_ref()
    }

    /// MIME type of the body, when set.
    pub fn content_type(&self) -> Option<&str> {
        self.text_property("content_type")
    }

    /// Encoding applied to the body, when set.
    pub fn content_encoding(&self) -> Option<&str> {
        self.text_property("content_encoding")
    }

    /// Correlation identifier linking a reply to its request.
    pub fn correlation_id(&self) -> Option<&str> {
        self.text_property("correlation_id")
    }

    /// Publisher-assigned message identifier.
    pub fn message_id(&self) -> Option<&str> {
        self.text_property("message_id")
    }

    /// Queue the publisher expects replies on.
    pub fn reply_to(&self) -> Option<&str> {
        self.text_property("reply_to")
    }

    /// Custom headers set by the publisher.
    pub fn application_headers(&self) -> Option<&Map<String, Value>> {
        self.property("application_headers").and_then(Value::as_object)
    }

    fn from_wire(wire: WireEnvelope) -> Self {
        Self {
            body: wire.body.into_bytes(),
            properties: wire.properties,
            delivery_info: wire.delivery_info,
        }
    }

    // AMQP leaves unset short-string properties as "", so blank values read
    // as absent.
    fn text_property(&self, name: &str) -> Option<&str> {
        self.property(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl DeliveryInfo {
    /// Wraps a raw delivery metadata map.
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Looks up a single field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Broker-assigned tag identifying this delivery on its channel.
    pub fn delivery_tag(&self) -> Option<u64> {
        self.get("delivery_tag").and_then(Value::as_u64)
    }

    /// Whether the broker has delivered this message before.
    pub fn redelivered(&self) -> Option<bool> {
        self.get("redelivered").and_then(Value::as_bool)
    }

    /// Exchange the message was published to.
    pub fn exchange(&self) -> Option<&str> {
        self.get("exchange").and_then(Value::as_str)
    }

    /// Routing key used when publishing.
    pub fn routing_key(&self) -> Option<&str> {
        self.get("routing_key").and_then(Value::as_str)
    }

    /// Tag of the consumer the broker delivered to.
    pub fn consumer_tag(&self) -> Option<&str> {
        self.get("consumer_tag").and_then(Value::as_str)
    }
}
