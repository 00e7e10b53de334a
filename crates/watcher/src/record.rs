//! Raw change-record buffer
//!
//! Backends write completed notifications into a session's buffer as a
//! sequence of variable-length little-endian records:
//!
//! ```text
//! +-------------------+-----------+-------------+----------------------+
//! | next_offset: u32  | action:u32| name_len:u32| name (utf-8, padded) |
//! +-------------------+-----------+-------------+----------------------+
//! ```
//!
//! `next_offset` is the byte distance to the following record, 0 on the
//! last one. Names are relative to the watched root and padded to 4 bytes.

use crate::error::RecordError;
use crate::event::Reason;
use bytes::{Buf, BufMut, BytesMut};
use parking_lot::Mutex;

/// Default notification buffer size (8 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 2 << 12;

const HEADER_LEN: usize = 12;

/// Fixed action codes carried in records
pub mod action {
    pub const ADDED: u32 = 1;
    pub const REMOVED: u32 = 2;
    pub const MODIFIED: u32 = 3;
    pub const RENAMED_OLD_NAME: u32 = 4;
    pub const RENAMED_NEW_NAME: u32 = 5;
}

/// Map an action code to its reason
///
/// There is no "unknown" reason; callers treat an error here as fatal.
pub fn reason_from_action(code: u32) -> Result<Reason, RecordError> {
    match code {
        action::ADDED => Ok(Reason::Added),
        action::REMOVED => Ok(Reason::Removed),
        action::MODIFIED => Ok(Reason::Modified),
        action::RENAMED_OLD_NAME => Ok(Reason::RenamedOldName),
        action::RENAMED_NEW_NAME => Ok(Reason::RenamedNewName),
        other => Err(RecordError::UnknownAction(other)),
    }
}

pub fn action_for(reason: Reason) -> u32 {
    match reason {
        Reason::Added => action::ADDED,
        Reason::Removed => action::REMOVED,
        Reason::Modified => action::MODIFIED,
        Reason::RenamedOldName => action::RENAMED_OLD_NAME,
        Reason::RenamedNewName => action::RENAMED_NEW_NAME,
    }
}

/// One undecoded change: relative file name plus action code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub action: u32,
}

impl RawRecord {
    pub fn new(name: impl Into<String>, reason: Reason) -> Self {
        Self {
            name: name.into(),
            action: action_for(reason),
        }
    }

    pub fn reason(&self) -> Result<Reason, RecordError> {
        reason_from_action(self.action)
    }

    /// Bytes this record occupies in a buffer, padding included
    pub fn encoded_len(&self) -> usize {
        (HEADER_LEN + self.name.len() + 3) & !3
    }
}

/// Encode records back to back into `out`
///
/// Returns false (and writes nothing) if they would exceed `capacity`.
pub fn encode_records(records: &[RawRecord], out: &mut BytesMut, capacity: usize) -> bool {
    let total: usize = records.iter().map(RawRecord::encoded_len).sum();
    if total > capacity {
        return false;
    }

    out.reserve(total);
    let last = records.len().saturating_sub(1);
    for (i, record) in records.iter().enumerate() {
        let len = record.encoded_len();
        let next = if i == last { 0 } else { len as u32 };
        out.put_u32_le(next);
        out.put_u32_le(record.action);
        out.put_u32_le(record.name.len() as u32);
        out.put_slice(record.name.as_bytes());
        out.put_bytes(0, len - HEADER_LEN - record.name.len());
    }
    true
}

/// Decode a record sequence, stopping at the first zero next-offset
pub fn decode_records(data: &[u8]) -> Result<Vec<RawRecord>, RecordError> {
    let mut records = Vec::new();
    if data.is_empty() {
        return Ok(records);
    }

    let mut offset = 0usize;
    loop {
        let mut cur = match data.get(offset..) {
            Some(rest) if rest.len() >= HEADER_LEN => rest,
            _ => return Err(RecordError::Truncated { offset }),
        };

        let next = cur.get_u32_le() as usize;
        let action = cur.get_u32_le();
        let name_len = cur.get_u32_le() as usize;
        if cur.remaining() < name_len {
            return Err(RecordError::Truncated { offset });
        }

        let name = std::str::from_utf8(&cur[..name_len])
            .map_err(|_| RecordError::InvalidName { offset })?;
        records.push(RawRecord {
            name: name.to_owned(),
            action,
        });

        if next == 0 {
            return Ok(records);
        }
        offset += next;
    }
}

/// Reusable buffer a backend fills on completion
pub struct NotifyBuffer {
    data: Mutex<BytesMut>,
    capacity: usize,
}

impl NotifyBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Mutex::new(BytesMut::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.data.lock().clear();
    }

    /// Replace the contents with `records`
    ///
    /// Returns the number of bytes written, or `None` if they overflow the
    /// buffer (which is then left empty).
    pub fn fill(&self, records: &[RawRecord]) -> Option<usize> {
        let mut data = self.data.lock();
        data.clear();
        if encode_records(records, &mut data, self.capacity) {
            Some(data.len())
        } else {
            None
        }
    }

    /// Decode the first `bytes` bytes of the buffer
    pub fn decode(&self, bytes: usize) -> Result<Vec<RawRecord>, RecordError> {
        let data = self.data.lock();
        let end = bytes.min(data.len());
        decode_records(&data[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_walks_offsets_in_order() {
        let records = vec![
            RawRecord::new("quickCss.css", Reason::Modified),
            RawRecord::new("themes/a.css", Reason::Added),
            RawRecord::new("old.css", Reason::RenamedOldName),
        ];
        let mut out = BytesMut::new();
        assert!(encode_records(&records, &mut out, DEFAULT_BUFFER_SIZE));
        assert_eq!(out.len() % 4, 0);

        let decoded = decode_records(&out).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_last_record_has_zero_offset() {
        let records = vec![RawRecord::new("a", Reason::Added), RawRecord::new("bb", Reason::Removed)];
        let mut out = BytesMut::new();
        encode_records(&records, &mut out, DEFAULT_BUFFER_SIZE);

        let first_next = u32::from_le_bytes(out[0..4].try_into().unwrap()) as usize;
        assert_eq!(first_next, records[0].encoded_len());
        let second_next =
            u32::from_le_bytes(out[first_next..first_next + 4].try_into().unwrap());
        assert_eq!(second_next, 0);
    }

    #[test]
    fn test_decode_stops_at_zero_offset() {
        let mut out = BytesMut::new();
        encode_records(&[RawRecord::new("a.css", Reason::Added)], &mut out, 64);
        // Trailing garbage after the terminal record is never read
        out.put_slice(&[0xff; 16]);
        assert_eq!(decode_records(&out).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_action_code() {
        assert_eq!(reason_from_action(9), Err(RecordError::UnknownAction(9)));
        for reason in Reason::ALL {
            assert_eq!(reason_from_action(action_for(reason)), Ok(reason));
        }
    }

    #[test]
    fn test_truncated_buffer() {
        let mut out = BytesMut::new();
        encode_records(&[RawRecord::new("file.css", Reason::Modified)], &mut out, 64);
        let err = decode_records(&out[..10]).unwrap_err();
        assert_eq!(err, RecordError::Truncated { offset: 0 });
    }

    #[test]
    fn test_fill_overflow_leaves_buffer_empty() {
        let buffer = NotifyBuffer::new(32);
        assert_eq!(buffer.fill(&[RawRecord::new("a", Reason::Added)]), Some(16));

        let big = vec![RawRecord::new("a-rather-long-file-name.css", Reason::Added); 2];
        assert_eq!(buffer.fill(&big), None);
        assert!(buffer.decode(buffer.capacity()).unwrap().is_empty());
    }
}
