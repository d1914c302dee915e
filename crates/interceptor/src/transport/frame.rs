//! gRPC 长度前缀帧
//!
//! 每帧 5 字节头：1 字节压缩标志 + 4 字节大端长度，之后是消息字节。
//! HTTP/2 数据块与帧边界无关，需要先缓冲再切分

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// 帧头长度
pub const HEADER_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcFrame {
    pub compressed: bool,
    pub payload: Bytes,
}

/// 帧重组器
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 取出下一个完整帧，数据不足时返回 None
    pub fn next_frame(&mut self) -> Option<GrpcFrame> {
        if self.buf.len() < HEADER_LEN {
            return None;
        }

        let compressed = self.buf[0] != 0;
        let len = u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]) as usize;
        if self.buf.len() < HEADER_LEN + len {
            return None;
        }

        self.buf.advance(HEADER_LEN);
        let payload = self.buf.split_to(len).freeze();
        Some(GrpcFrame {
            compressed,
            payload,
        })
    }

    /// 尚未组成完整帧的字节数
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

/// 编码一个帧
pub fn encode_frame(payload: &[u8], compressed: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(u8::from(compressed));
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frames_across_chunks() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&encode_frame(b"first", false));
        wire.extend_from_slice(&encode_frame(b"", false));
        wire.extend_from_slice(&encode_frame(b"third", true));

        let mut decoder = FrameDecoder::default();
        let mut frames = Vec::new();
        for chunk in wire.chunks(3) {
            decoder.push(chunk);
            while let Some(frame) = decoder.next_frame() {
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0].payload[..], b"first");
        assert!(frames[1].payload.is_empty());
        assert!(frames[2].compressed);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_incomplete_frame_is_held() {
        let frame = encode_frame(b"partial", false);
        let mut decoder = FrameDecoder::default();
        decoder.push(&frame[..HEADER_LEN + 2]);

        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.buffered(), HEADER_LEN + 2);

        decoder.push(&frame[HEADER_LEN + 2..]);
        assert_eq!(&decoder.next_frame().unwrap().payload[..], b"partial");
    }
}
