//! Payment webhook signature verification.
//!
//! Implements verification of provider webhook signatures using HMAC-SHA256.
//! Includes timestamp validation to prevent replay attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{PaymentEvent, WebhookError};

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the signature header.
///
/// Format: `t=<timestamp>,v1=<hex signature>`. Unknown fields are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Verifier for payment webhook signatures.
pub struct WebhookVerifier {
    /// The webhook signing secret from the provider dashboard.
    secret: String,
}

impl WebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within acceptable range
    /// 3. Compute expected signature using HMAC-SHA256
    /// 4. Compare signatures using constant-time comparison
    /// 5. Parse the JSON payload into a PaymentEvent
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - Signature verification failed
    /// - `TimestampOutOfRange` - Event is older than 5 minutes
    /// - `InvalidTimestamp` - Event timestamp is in the future
    /// - `ParseError` - Failed to parse header or JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaymentEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected_signature = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected_signature, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: PaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the given timestamp and payload.
    ///
    /// The signed payload is `<timestamp>.<raw body>`.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the
/// expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a valid signature header for test fixtures.
#[cfg(test)]
pub fn sign_test_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    fn valid_payload() -> String {
        serde_json::json!({
            "id": "evt_test123",
            "type": "payment_intent.succeeded",
            "created": 1704067200,
            "data": {"object": {}},
            "livemode": false
        })
        .to_string()
    }

    // Header parsing

    #[test]
    fn parse_header_with_v1() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={}", signature);

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={},v0=legacy,scheme=hmac", signature);

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("t=soon,v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_no_equals_fails() {
        let result = SignatureHeader::parse("t1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // Signature verification

    #[test]
    fn verify_valid_signature() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = valid_payload();
        let header = sign_test_payload(TEST_SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = verifier.verify_and_parse(payload.as_bytes(), &header).unwrap();

        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn verify_invalid_signature_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = valid_payload();
        let header = format!("t={},v1={}", chrono::Utc::now().timestamp(), "a".repeat(64));

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = WebhookVerifier::new("wrong_secret");
        let payload = valid_payload();
        let header = sign_test_payload(TEST_SECRET, chrono::Utc::now().timestamp(), &payload);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = valid_payload();
        let header = sign_test_payload(TEST_SECRET, chrono::Utc::now().timestamp(), &payload);
        let tampered = payload.replace("evt_test123", "evt_hacked");

        let result = verifier.verify_and_parse(tampered.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    // Timestamp validation

    #[test]
    fn timestamp_within_range_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 120;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_too_old_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 600;
        assert!(matches!(
            verifier.validate_timestamp(timestamp),
            Err(WebhookError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn timestamp_at_boundary_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 300;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_just_past_boundary_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 301;
        assert!(matches!(
            verifier.validate_timestamp(timestamp),
            Err(WebhookError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn timestamp_from_future_with_skew_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 30;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_from_future_beyond_skew_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 120;
        assert!(matches!(
            verifier.validate_timestamp(timestamp),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    // Payload parsing

    #[test]
    fn verify_invalid_json_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = "not valid json";
        let header = sign_test_payload(TEST_SECRET, chrono::Utc::now().timestamp(), payload);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // Constant-time comparison

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
