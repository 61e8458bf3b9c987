//! Serial wire-frame codec
//!
//! Reading a frame follows the coordinator's RPC discipline: one start
//! byte, one length byte, then exactly `len` body bytes accumulated across
//! however many reads the link needs. A read that makes no progress is
//! retried after a short delay up to [`READ_RETRY_LIMIT`] times; past that
//! the whole read cycle is abandoned and no frame is produced.
//!
//! Decoded bodies are lifted into [`SocFrame`] once, with bounds-checked
//! field extraction, so nothing downstream touches raw offsets.

use crate::error::{Error, Result};
use crate::soc::constants::{APP_CMD1_CTRL_RSP, APP_CMD1_DATA_RSP, SOC_SOF};
use crate::transport::Transport;
use std::time::Duration;

/// Consecutive no-progress reads tolerated within one frame
pub const READ_RETRY_LIMIT: u32 = 5;

/// Delay between read retries
pub const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// XOR frame-check sequence over the given bytes
///
/// The wire checksum covers the length byte through the last payload byte;
/// callers pass exactly that slice.
pub fn calc_fcs(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Fill `buf` completely, retrying stalled reads with a bounded budget
fn read_exact_retry<T: Transport + ?Sized>(link: &mut T, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    let mut retries = 0u32;

    while filled < buf.len() {
        match link.read(&mut buf[filled..]) {
            Ok(0) | Err(Error::Io(_)) => {
                // Link stalled mid-frame; give it a moment and try again
                retries += 1;
                if retries > READ_RETRY_LIMIT {
                    return Err(Error::RetryExhausted);
                }
                std::thread::sleep(READ_RETRY_DELAY);
            }
            Ok(n) => {
                filled += n;
                retries = 0;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Read one frame body from the serial link
///
/// Returns `Ok(None)` when no byte is pending at all, `Ok(Some(body))`
/// with the `len` bytes following the length field (selector included),
/// or an error for a bad start byte / exhausted retry budget. Errors are
/// per-cycle: the caller logs and keeps servicing other sources.
pub fn read_frame<T: Transport + ?Sized>(link: &mut T) -> Result<Option<Vec<u8>>> {
    let mut sof = [0u8; 1];
    if link.read(&mut sof)? == 0 {
        return Ok(None);
    }
    if sof[0] != SOC_SOF {
        return Err(Error::BadSof(sof[0]));
    }

    let mut len = [0u8; 1];
    read_exact_retry(link, &mut len)?;

    let mut body = vec![0u8; len[0] as usize];
    read_exact_retry(link, &mut body)?;

    log::debug!("soc rx frame: len={} body={:02X?}", len[0], body);
    Ok(Some(body))
}

/// Inbound data-class (ZCL) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Network address of the responding device
    pub src_addr: u16,
    pub endpoint: u8,
    pub dst_endpoint: u8,
    pub cluster_id: u16,
    pub addr_mode: u8,
    pub frame_ctrl: u8,
    pub seq: u8,
    pub cmd_id: u8,
    pub payload: Vec<u8>,
}

/// Inbound control-class indication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFrame {
    pub cmd_id: u8,
    pub payload: Vec<u8>,
}

/// One decoded coordinator frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocFrame {
    Data(DataFrame),
    Control(ControlFrame),
}

// Header sizes after the two selector bytes
const DATA_HEADER_LEN: usize = 11;
const CTRL_HEADER_LEN: usize = 13;

impl SocFrame {
    /// Decode a frame body (selector bytes included)
    ///
    /// Returns `Ok(None)` for selectors this bridge does not handle.
    /// Short bodies fail closed with a `MalformedFrame` error.
    pub fn decode(body: &[u8]) -> Result<Option<SocFrame>> {
        if body.len() < 2 {
            return Err(Error::MalformedFrame(format!(
                "body too short for selector: {} bytes",
                body.len()
            )));
        }
        let rest = &body[2..];

        match body[1] {
            APP_CMD1_DATA_RSP => {
                if rest.len() < DATA_HEADER_LEN {
                    return Err(Error::MalformedFrame(format!(
                        "data response header truncated: {} bytes",
                        rest.len()
                    )));
                }
                Ok(Some(SocFrame::Data(DataFrame {
                    endpoint: rest[0],
                    src_addr: u16::from_le_bytes([rest[1], rest[2]]),
                    dst_endpoint: rest[3],
                    cluster_id: u16::from_le_bytes([rest[4], rest[5]]),
                    addr_mode: rest[7],
                    frame_ctrl: rest[8],
                    seq: rest[9],
                    cmd_id: rest[10],
                    payload: rest[DATA_HEADER_LEN..].to_vec(),
                })))
            }
            APP_CMD1_CTRL_RSP => {
                if rest.len() < CTRL_HEADER_LEN {
                    return Err(Error::MalformedFrame(format!(
                        "control indication header truncated: {} bytes",
                        rest.len()
                    )));
                }
                Ok(Some(SocFrame::Control(ControlFrame {
                    cmd_id: rest[10],
                    payload: rest[CTRL_HEADER_LEN..].to_vec(),
                })))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::constants::{APP_CMD0, CLUSTER_ON_OFF};
    use crate::transport::MockTransport;

    fn data_body(cluster: u16, cmd_id: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![
            APP_CMD0,
            APP_CMD1_DATA_RSP,
            0x0B,              // endpoint
            0x34, 0x12,        // src addr 0x1234
            0x0B,              // dst endpoint
            cluster as u8, (cluster >> 8) as u8,
            (3 + payload.len()) as u8, // data len
            0x02,              // addr mode
            0x01,              // frame ctrl
            0x2A,              // seq
            cmd_id,
        ];
        body.extend_from_slice(payload);
        body
    }

    #[test]
    fn test_calc_fcs() {
        assert_eq!(calc_fcs(&[]), 0);
        assert_eq!(calc_fcs(&[0x13]), 0x13);
        assert_eq!(calc_fcs(&[0x0D, 0x29, 0x00, 0x0B]), 0x0D ^ 0x29 ^ 0x0B);
    }

    #[test]
    fn test_read_frame_whole() {
        let mut link = MockTransport::new();
        link.inject_read(&[SOC_SOF, 4, 0x49, 0x80, 0xAA, 0xBB]);

        let body = read_frame(&mut link).unwrap().unwrap();
        assert_eq!(body, vec![0x49, 0x80, 0xAA, 0xBB]);
    }

    #[test]
    fn test_read_frame_accumulates_short_reads() {
        let mut link = MockTransport::new();
        link.inject_read(&[SOC_SOF, 6, 0x49, 0x80, 1, 2, 3, 4]);
        link.set_max_read_chunk(2);

        let body = read_frame(&mut link).unwrap().unwrap();
        assert_eq!(body, vec![0x49, 0x80, 1, 2, 3, 4]);
    }

    #[test]
    fn test_read_frame_no_data() {
        let mut link = MockTransport::new();
        assert!(read_frame(&mut link).unwrap().is_none());
    }

    #[test]
    fn test_read_frame_bad_sof() {
        let mut link = MockTransport::new();
        link.inject_read(&[0x42, 4, 0x49, 0x80, 0xAA, 0xBB]);

        match read_frame(&mut link) {
            Err(Error::BadSof(b)) => assert_eq!(b, 0x42),
            other => panic!("expected BadSof, got {:?}", other),
        }
    }

    #[test]
    fn test_read_frame_retry_exhaustion() {
        let mut link = MockTransport::new();
        // Length promises 5 body bytes but only 2 ever arrive
        link.inject_read(&[SOC_SOF, 5, 0x49, 0x80]);

        match read_frame(&mut link) {
            Err(Error::RetryExhausted) => {}
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_data_frame() {
        let body = data_body(CLUSTER_ON_OFF, 0x01, &[]);
        let frame = SocFrame::decode(&body).unwrap().unwrap();

        match frame {
            SocFrame::Data(d) => {
                assert_eq!(d.src_addr, 0x1234);
                assert_eq!(d.cluster_id, CLUSTER_ON_OFF);
                assert_eq!(d.cmd_id, 0x01);
                assert_eq!(d.seq, 0x2A);
                assert!(d.payload.is_empty());
            }
            other => panic!("expected data frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_frame() {
        let mut body = vec![APP_CMD0, APP_CMD1_CTRL_RSP];
        body.extend_from_slice(&[
            0x0B, 0, 0, 0, 0xFF, 0xFF, 3, 0, 0, 0, 0x07, 0, 0,
        ]);
        body.extend_from_slice(&[0x34, 0x12]); // payload

        let frame = SocFrame::decode(&body).unwrap().unwrap();
        match frame {
            SocFrame::Control(c) => {
                assert_eq!(c.cmd_id, 0x07);
                assert_eq!(c.payload, vec![0x34, 0x12]);
            }
            other => panic!("expected control frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_truncated_fails_closed() {
        let body = vec![APP_CMD0, APP_CMD1_DATA_RSP, 0x0B, 0x34];
        assert!(matches!(
            SocFrame::decode(&body),
            Err(Error::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_decode_unknown_selector_ignored() {
        let body = vec![APP_CMD0, 0x42, 1, 2, 3];
        assert!(SocFrame::decode(&body).unwrap().is_none());
    }
}
