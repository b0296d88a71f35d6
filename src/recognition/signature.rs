use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

pub const HTTP_METHOD: &str = "POST";
pub const HTTP_URI: &str = "/v1/identify";
pub const SIGNATURE_VERSION: &str = "1";

/// Signature for an identify request: base64(HMAC-SHA1(secret, string_to_sign))
pub fn sign(access_key: &str, access_secret: &str, data_type: &str, timestamp: i64) -> String {
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        HTTP_METHOD, HTTP_URI, access_key, data_type, SIGNATURE_VERSION, timestamp
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(access_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
