//! OSC Packet Codec
//!
//! Wire format for chatbox control messages (OSC 1.0 messages, no bundles).
//!
//! # Message Format
//!
//! ```text
//! +------------------------+------------------------+---------------------------+
//! | Address (padded)       | Type tags (padded)     | Arguments                 |
//! | "/chatbox/input\0\0"   | ",sTF\0\0\0\0"         | string data (padded)      |
//! +------------------------+------------------------+---------------------------+
//! ```
//!
//! Strings are NUL-terminated and padded with NULs to a multiple of 4 bytes.
//! Booleans carry no data: they live entirely in the type tag (`T`/`F`).
//! Integers and floats are 32-bit big-endian.

use super::TransportError;

/// Maximum packet size (largest UDP payload over IPv4)
pub const MAX_PACKET_SIZE: usize = 65_507;

/// A single OSC argument
#[derive(Clone, Debug, PartialEq)]
pub enum OscArg {
    /// `s`: UTF-8 string
    Str(String),
    /// `T` / `F`: boolean
    Bool(bool),
    /// `i`: 32-bit integer
    Int(i32),
    /// `f`: 32-bit float
    Float(f32),
}

impl OscArg {
    fn tag(&self) -> char {
        match self {
            Self::Str(_) => 's',
            Self::Bool(true) => 'T',
            Self::Bool(false) => 'F',
            Self::Int(_) => 'i',
            Self::Float(_) => 'f',
        }
    }
}

/// An OSC message: an address pattern plus ordered arguments
#[derive(Clone, Debug, PartialEq)]
pub struct OscMessage {
    /// Address pattern, e.g. `/chatbox/input`
    pub address: String,
    /// Arguments in order
    pub args: Vec<OscArg>,
}

impl OscMessage {
    /// Create a message
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// First string argument, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            OscArg::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Encode to bytes
    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        encode(self)
    }

    /// Decode from bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, TransportError> {
        decode(bytes)
    }
}

fn padded_len(len: usize) -> usize {
    (len + 4) & !3
}

fn write_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.resize(buf.len() + padded_len(s.len()) - s.len(), 0);
}

/// Encode a message to an OSC packet
///
/// # Errors
///
/// Returns `TransportError::Encoding` if:
/// - the address does not start with `/`
/// - a string contains an interior NUL
/// - the packet exceeds `MAX_PACKET_SIZE`
pub fn encode(msg: &OscMessage) -> Result<Vec<u8>, TransportError> {
    if !msg.address.starts_with('/') {
        return Err(TransportError::Encoding(format!(
            "Address must start with '/': {:?}",
            msg.address
        )));
    }
    if msg.address.contains('\0') {
        return Err(TransportError::Encoding("NUL byte in address".to_string()));
    }

    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    tags.extend(msg.args.iter().map(OscArg::tag));

    let mut buf = Vec::with_capacity(64);
    write_padded_str(&mut buf, &msg.address);
    write_padded_str(&mut buf, &tags);

    for arg in &msg.args {
        match arg {
            OscArg::Str(s) => {
                if s.contains('\0') {
                    return Err(TransportError::Encoding(
                        "NUL byte in string argument".to_string(),
                    ));
                }
                write_padded_str(&mut buf, s);
            }
            OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Bool(_) => {}
        }
    }

    if buf.len() > MAX_PACKET_SIZE {
        return Err(TransportError::Encoding(format!(
            "Packet too large: {} bytes (max: {})",
            buf.len(),
            MAX_PACKET_SIZE
        )));
    }

    Ok(buf)
}

/// Cursor over an OSC packet
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_str(&mut self) -> Result<&'a str, TransportError> {
        let rest = &self.bytes[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| TransportError::Encoding("Unterminated string".to_string()))?;
        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|e| TransportError::Encoding(e.to_string()))?;
        let next = self.pos + padded_len(nul);
        if next > self.bytes.len() {
            return Err(TransportError::Encoding("Truncated string padding".to_string()));
        }
        self.pos = next;
        Ok(s)
    }

    fn read_word(&mut self) -> Result<[u8; 4], TransportError> {
        let end = self.pos + 4;
        let word = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| TransportError::Encoding("Truncated argument".to_string()))?;
        self.pos = end;
        Ok([word[0], word[1], word[2], word[3]])
    }
}

/// Decode an OSC packet into a message
///
/// # Errors
///
/// Returns `TransportError::Encoding` for truncated packets, missing type tags
/// or unsupported argument types.
pub fn decode(bytes: &[u8]) -> Result<OscMessage, TransportError> {
    if bytes.len() > MAX_PACKET_SIZE {
        return Err(TransportError::Encoding(format!(
            "Packet size {} exceeds maximum {MAX_PACKET_SIZE}",
            bytes.len()
        )));
    }

    let mut reader = Reader { bytes, pos: 0 };
    let address = reader.read_str()?.to_string();
    if !address.starts_with('/') {
        return Err(TransportError::Encoding(format!("Bad address: {address:?}")));
    }

    let tags = reader.read_str()?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(TransportError::Encoding("Missing type tag string".to_string()));
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            's' => OscArg::Str(reader.read_str()?.to_string()),
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'i' => OscArg::Int(i32::from_be_bytes(reader.read_word()?)),
            'f' => OscArg::Float(f32::from_be_bytes(reader.read_word()?)),
            other => {
                return Err(TransportError::Encoding(format!(
                    "Unsupported type tag '{other}'"
                )))
            }
        };
        args.push(arg);
    }

    Ok(OscMessage { address, args })
}
