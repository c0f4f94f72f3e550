//! Encode/decode between [`OscPacket`] and the OSC 1.0 wire format.
//!
//! Both directions reuse a caller-provided scratch buffer so a hot sender
//! doesn't allocate per message (§4.3 "scratch reuse"): [`Encoder::encode`]
//! clears and writes into its own `Vec<u8>`, returned by reference.

use crate::addr_cache::AddressCache;
use crate::constants::{ADDRESS_CACHE_CAPACITY, BUNDLE_MAGIC, MAX_BUNDLE_DEPTH};
use crate::error::CodecError;
use crate::value::{OscBundle, OscMessage, OscPacket, OscValue, TimeTag};

fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

fn write_padded_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes);
    buf.push(0);
    let total = bytes.len() + 1;
    for _ in total..pad4(total) {
        buf.push(0);
    }
}

fn encode_message_into(buf: &mut Vec<u8>, msg: &OscMessage, addr_cache: &mut AddressCache) {
    let addr = addr_cache.intern(&msg.addr);
    write_padded_bytes(buf, addr.as_bytes());

    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    for arg in &msg.args {
        tags.push(arg.type_tag());
    }
    write_padded_bytes(buf, tags.as_bytes());

    for arg in &msg.args {
        match arg {
            OscValue::Int32(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscValue::Float32(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscValue::Int64(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscValue::Float64(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscValue::Time(t) => {
                buf.extend_from_slice(&t.seconds.to_be_bytes());
                buf.extend_from_slice(&t.fraction.to_be_bytes());
            }
            OscValue::Str(s) => write_padded_bytes(buf, s.as_bytes()),
            OscValue::Blob(data) => {
                buf.extend_from_slice(&(data.len() as i32).to_be_bytes());
                buf.extend_from_slice(data);
                for _ in data.len()..pad4(data.len()) {
                    buf.push(0);
                }
            }
            OscValue::Bool(_) | OscValue::Nil => {}
        }
    }
}

fn encode_bundle_into(buf: &mut Vec<u8>, bundle: &OscBundle, addr_cache: &mut AddressCache) {
    buf.extend_from_slice(BUNDLE_MAGIC);
    buf.extend_from_slice(&bundle.time.seconds.to_be_bytes());
    buf.extend_from_slice(&bundle.time.fraction.to_be_bytes());
    for packet in &bundle.packets {
        let mut inner = Vec::new();
        encode_packet_into(&mut inner, packet, addr_cache);
        buf.extend_from_slice(&(inner.len() as i32).to_be_bytes());
        buf.extend_from_slice(&inner);
    }
}

fn encode_packet_into(buf: &mut Vec<u8>, packet: &OscPacket, addr_cache: &mut AddressCache) {
    match packet {
        OscPacket::Message(m) => encode_message_into(buf, m, addr_cache),
        OscPacket::Bundle(b) => encode_bundle_into(buf, b, addr_cache),
    }
}

/// Reusable encode scratch buffer. Also owns the address LRU (§4.3) so
/// repeated addresses on the hot path don't re-allocate.
pub struct Encoder {
    buf: Vec<u8>,
    addr_cache: AddressCache,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            buf: Vec::new(),
            addr_cache: AddressCache::new(ADDRESS_CACHE_CAPACITY),
        }
    }
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `packet`, reusing this encoder's internal buffer, and returns
    /// a reference to the encoded bytes valid until the next call.
    pub fn encode(&mut self, packet: &OscPacket) -> &[u8] {
        self.buf.clear();
        encode_packet_into(&mut self.buf, packet, &mut self.addr_cache);
        &self.buf
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                wanted: n,
                available: self.remaining(),
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn take_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Reads a NUL-terminated, 4-byte padded OSC string.
    fn take_osc_string(&mut self) -> Result<String, CodecError> {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() && self.bytes[end] != 0 {
            end += 1;
        }
        if end >= self.bytes.len() {
            return Err(CodecError::Truncated {
                wanted: 1,
                available: 0,
            });
        }
        let padded_total = pad4(end - start + 1);
        self.take(padded_total)?;
        std::str::from_utf8(&self.bytes[start..end])
            .map(str::to_owned)
            .map_err(|_| CodecError::StringNotUtf8)
    }

    fn take_osc_blob(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.take_i32()?.max(0) as usize;
        let data = self.take(len)?.to_vec();
        let pad = pad4(len) - len;
        if pad > 0 {
            self.take(pad)?;
        }
        Ok(data)
    }
}

fn decode_message(addr: String, cursor: &mut Cursor<'_>) -> Result<OscMessage, CodecError> {
    let tags = cursor.take_osc_string()?;
    let mut chars = tags.chars();
    if chars.next() != Some(',') {
        return Err(CodecError::BadTypeTag);
    }

    let mut args = Vec::new();
    for tag in chars {
        let value = match tag {
            'i' => OscValue::Int32(cursor.take_i32()?),
            'f' => OscValue::Float32(cursor.take_f32()?),
            'h' => OscValue::Int64(cursor.take_i64()?),
            'd' => OscValue::Float64(cursor.take_f64()?),
            's' => OscValue::Str(cursor.take_osc_string()?),
            'b' => OscValue::Blob(cursor.take_osc_blob()?),
            'T' => OscValue::Bool(true),
            'F' => OscValue::Bool(false),
            'N' => OscValue::Nil,
            't' => OscValue::Time(TimeTag {
                seconds: cursor.take_u32()?,
                fraction: cursor.take_u32()?,
            }),
            other => return Err(CodecError::UnsupportedArg(other)),
        };
        args.push(value);
    }

    Ok(OscMessage { addr, args })
}

fn decode_bundle(cursor: &mut Cursor<'_>, depth: usize) -> Result<OscBundle, CodecError> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(CodecError::BadMagic);
    }
    let time = TimeTag {
        seconds: cursor.take_u32()?,
        fraction: cursor.take_u32()?,
    };
    let mut packets = Vec::new();
    while cursor.remaining() > 0 {
        let size = cursor.take_i32()?.max(0) as usize;
        let inner_bytes = cursor.take(size)?;
        let mut inner_cursor = Cursor::new(inner_bytes);
        packets.push(decode_packet(&mut inner_cursor, depth + 1)?);
    }
    Ok(OscBundle { time, packets })
}

fn decode_packet(cursor: &mut Cursor<'_>, depth: usize) -> Result<OscPacket, CodecError> {
    let addr = cursor.take_osc_string()?;
    if addr == "#bundle" {
        // `take_osc_string` consumed the padded "#bundle\0" already; the
        // timetag follows directly, matching `decode_bundle`'s expectations.
        return Ok(OscPacket::Bundle(decode_bundle(cursor, depth)?));
    }
    Ok(OscPacket::Message(decode_message(addr, cursor)?))
}

/// Decodes a single top-level OSC packet (message or bundle) from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<OscPacket, CodecError> {
    let mut cursor = Cursor::new(bytes);
    decode_packet(&mut cursor, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips() {
        let msg = OscPacket::Message(OscMessage {
            addr: "/n_set".to_string(),
            args: vec![
                OscValue::Int32(1000),
                OscValue::Str("freq".to_string()),
                OscValue::Float32(440.0),
                OscValue::Bool(true),
                OscValue::Nil,
            ],
        });
        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&msg).to_vec();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn bundle_with_nested_bundle_round_trips() {
        let inner = OscBundle {
            time: TimeTag::IMMEDIATE,
            packets: vec![OscPacket::Message(OscMessage {
                addr: "/s_new".to_string(),
                args: vec![OscValue::Str("sine".to_string()), OscValue::Int32(1001)],
            })],
        };
        let outer = OscPacket::Bundle(OscBundle {
            time: TimeTag { seconds: 42, fraction: 7 },
            packets: vec![OscPacket::Bundle(inner.clone()), OscPacket::Message(OscMessage {
                addr: "/n_free".to_string(),
                args: vec![OscValue::Int32(1001)],
            })],
        });

        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&outer).to_vec();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, outer);
    }

    #[test]
    fn blob_round_trips_with_padding() {
        let msg = OscPacket::Message(OscMessage {
            addr: "/b_setn".to_string(),
            args: vec![OscValue::Blob(vec![1, 2, 3, 4, 5])],
        });
        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&msg).to_vec();
        assert_eq!(bytes.len() % 4, 0, "frame must stay 4-byte aligned");
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn truncated_packet_reports_truncated() {
        let msg = OscPacket::Message(OscMessage {
            addr: "/x".to_string(),
            args: vec![OscValue::Int32(1)],
        });
        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&msg).to_vec();
        let err = decode(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn bad_type_tag_char_is_rejected() {
        let mut bytes = Vec::new();
        write_padded_bytes(&mut bytes, b"/x");
        write_padded_bytes(&mut bytes, b",z");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedArg('z')));
    }
}
