use std::net::Ipv4Addr;

pub const ERROR_MESSAGE_INVALID_TARGET: &str =
    "Target must be an S3 path starting with 's3://' (e.g., s3://bucket/prefix).";

/// Validate an `s3://bucket[/prefix]` target, including the bucket name rules.
pub fn check_s3_target(target: &str) -> Result<String, String> {
    let Some(without_scheme) = target.strip_prefix("s3://") else {
        return Err(ERROR_MESSAGE_INVALID_TARGET.to_string());
    };

    let bucket = without_scheme.split('/').next().unwrap_or_default();
    if bucket.is_empty() {
        return Err(ERROR_MESSAGE_INVALID_TARGET.to_string());
    }
    check_bucket_name(bucket)?;

    Ok(target.to_string())
}

/// General purpose bucket naming rules: 3 to 63 characters of lowercase
/// letters, digits, dots and hyphens, beginning and ending with a letter or
/// digit, no adjacent dots and not formatted as an IPv4 address.
pub fn check_bucket_name(bucket: &str) -> Result<(), String> {
    let invalid = |reason: &str| Err(format!("invalid bucket name '{bucket}': {reason}"));

    if bucket.len() < 3 || bucket.len() > 63 {
        return invalid("must be between 3 and 63 characters long");
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return invalid("only lowercase letters, digits, dots and hyphens are allowed");
    }
    let first_and_last = [bucket.chars().next(), bucket.chars().last()];
    if !first_and_last
        .iter()
        .flatten()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return invalid("must begin and end with a letter or digit");
    }
    if bucket.contains("..") {
        return invalid("must not contain two adjacent periods");
    }
    if bucket.parse::<Ipv4Addr>().is_ok() {
        return invalid("must not be formatted as an IP address");
    }

    Ok(())
}
