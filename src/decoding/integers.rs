use chrono::{DateTime, Utc};

use super::errors::CodecError;

/// Decode an unsigned little-endian integer of `width` bytes (1 to 8).
///
/// Bytes past `width` are ignored; a shorter slice is a hard failure.
pub fn decode_le_uint(bytes: &[u8], width: usize) -> Result<u64, CodecError> {
    if width == 0 || width > 8 {
        return Err(CodecError::UnsupportedWidth(width));
    }
    if bytes.len() < width {
        return Err(CodecError::Truncated {
            expected: width,
            actual: bytes.len(),
        });
    }

    let mut padded = [0u8; 8];
    padded[..width].copy_from_slice(&bytes[..width]);
    Ok(u64::from_le_bytes(padded))
}

pub fn decode_le_u16(bytes: &[u8]) -> Result<u16, CodecError> {
    let field: [u8; 2] = take(bytes)?;
    Ok(u16::from_le_bytes(field))
}

pub fn decode_le_u32(bytes: &[u8]) -> Result<u32, CodecError> {
    let field: [u8; 4] = take(bytes)?;
    Ok(u32::from_le_bytes(field))
}

/// Decode a 32-bit little-endian count of seconds since the Unix epoch
pub fn decode_epoch_seconds(bytes: &[u8]) -> Result<DateTime<Utc>, CodecError> {
    let seconds = decode_le_u32(bytes)?;
    DateTime::from_timestamp(i64::from(seconds), 0)
        .ok_or(CodecError::TimestampOutOfRange(u64::from(seconds)))
}

/// Inverse of [`decode_epoch_seconds`]; sub-second precision is dropped.
pub fn encode_epoch_seconds(time: DateTime<Utc>) -> Result<[u8; 4], CodecError> {
    let seconds = time.timestamp();
    let seconds =
        u32::try_from(seconds).map_err(|_| CodecError::TimestampOutOfRange(seconds as u64))?;
    Ok(seconds.to_le_bytes())
}

fn take<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes
        .get(..N)
        .and_then(|field| field.try_into().ok())
        .ok_or(CodecError::Truncated {
            expected: N,
            actual: bytes.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_le_u16_reverses_byte_order() {
        assert_eq!(decode_le_u16(&[0x34, 0x12]).unwrap(), 0x1234);
    }

    #[test]
    fn test_decode_le_uint_matches_fixed_width_helpers() {
        let bytes = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(decode_le_uint(&bytes, 4).unwrap(), 0x1234_5678);
        assert_eq!(decode_le_uint(&bytes, 2).unwrap(), 0x5678);
        assert_eq!(
            decode_le_uint(&bytes, 4).unwrap(),
            u64::from(decode_le_u32(&bytes).unwrap())
        );
    }

    #[test]
    fn test_short_slice_is_truncated_not_zero_filled() {
        let err = decode_le_u32(&[0x01, 0x02]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                expected: 4,
                actual: 2
            }
        );
        assert!(decode_le_uint(&[0x01], 2).is_err());
    }

    #[test]
    fn test_unsupported_width() {
        assert_eq!(
            decode_le_uint(&[0; 16], 9).unwrap_err(),
            CodecError::UnsupportedWidth(9)
        );
        assert_eq!(
            decode_le_uint(&[0; 16], 0).unwrap_err(),
            CodecError::UnsupportedWidth(0)
        );
    }

    #[test]
    fn test_decode_epoch_seconds() {
        // 2003-04-05 06:07:08 UTC
        let expected = Utc.with_ymd_and_hms(2003, 4, 5, 6, 7, 8).unwrap();
        let bytes = (expected.timestamp() as u32).to_le_bytes();
        assert_eq!(decode_epoch_seconds(&bytes).unwrap(), expected);
    }

    #[test]
    fn test_encode_then_decode_truncates_to_seconds() {
        let time = Utc.with_ymd_and_hms(2005, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(750);
        let bytes = encode_epoch_seconds(time).unwrap();
        let decoded = decode_epoch_seconds(&bytes).unwrap();
        assert_eq!(decoded.timestamp(), time.timestamp());
        assert_eq!(decoded.timestamp_subsec_millis(), 0);
    }

    #[test]
    fn test_encode_rejects_pre_epoch() {
        let time = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            encode_epoch_seconds(time),
            Err(CodecError::TimestampOutOfRange(_))
        ));
    }
}
