//! Bit packing layer for variable-width codes
//!
//! Codes are packed MSB first with no gaps between them.  Both directions
//! use an integer accumulator holding up to 7 carried bits plus the bits of
//! the code in flight, so no per-bit storage is ever allocated.

use std::io::{Read,Write,ErrorKind};

/// widest code either side will handle
pub const MAX_CODE_BITS: usize = 16;

/// Writes variable-width codes to a byte sink, MSB first.
/// Complete bytes go to the sink as soon as they form, `flush` pads
/// the trailing partial byte with zero bits on the low side.
pub struct BitWriter<W: Write> {
    sink: W,
    acc: u32,
    nbits: usize,
    written: u64
}

impl<W: Write> BitWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            acc: 0,
            nbits: 0,
            written: 0
        }
    }
    /// Append the low `width` bits of `code`, most significant bit first.
    /// Panics if `width` exceeds 16 or `code` does not fit in `width` bits.
    pub fn put_code(&mut self,width: usize,code: u16) -> Result<(),std::io::Error> {
        assert!(width <= MAX_CODE_BITS,"code width {} out of range",width);
        assert!(width == MAX_CODE_BITS || (code as u32) < 1 << width,"code {} does not fit in {} bits",code,width);
        self.acc = (self.acc << width) | code as u32;
        self.nbits += width;
        while self.nbits >= 8 {
            let by = (self.acc >> (self.nbits - 8)) as u8;
            self.sink.write_all(&[by])?;
            self.nbits -= 8;
            self.written += 1;
        }
        self.acc &= (1 << self.nbits) - 1;
        Ok(())
    }
    /// Pad any trailing partial byte with zero bits and flush the sink.
    pub fn flush(&mut self) -> Result<(),std::io::Error> {
        if self.nbits > 0 {
            let by = ((self.acc << (8 - self.nbits)) & 0xff) as u8;
            self.sink.write_all(&[by])?;
            self.acc = 0;
            self.nbits = 0;
            self.written += 1;
        }
        self.sink.flush()
    }
    /// bytes pushed to the sink so far, padding included once flushed
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

/// Reads variable-width codes from a byte source, MSB first.
/// Symmetric to `BitWriter`, carrying at most 7 unread bits between calls.
pub struct BitReader<R: Read> {
    source: R,
    acc: u32,
    nbits: usize,
    consumed: u64
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            acc: 0,
            nbits: 0,
            consumed: 0
        }
    }
    /// Read the next `width` bits as one MSB first code.  Returns `None` if
    /// the source was already exhausted on a code boundary, while running
    /// out mid-code surfaces as an `UnexpectedEof` error.
    pub fn get_code(&mut self,width: usize) -> Result<Option<u16>,std::io::Error> {
        assert!(width <= MAX_CODE_BITS,"code width {} out of range",width);
        let mut by: [u8;1] = [0];
        while self.nbits < width {
            match self.source.read_exact(&mut by) {
                Ok(()) => {
                    self.acc = (self.acc << 8) | by[0] as u32;
                    self.nbits += 8;
                    self.consumed += 1;
                },
                Err(e) if e.kind()==ErrorKind::UnexpectedEof && self.nbits==0 => {
                    return Ok(None);
                },
                Err(e) => return Err(e)
            }
        }
        let code = (self.acc >> (self.nbits - width)) as u16 & ((1u32 << width) - 1) as u16;
        self.nbits -= width;
        self.acc &= (1 << self.nbits) - 1;
        Ok(Some(code))
    }
    /// bytes pulled from the source so far
    pub fn bytes_read(&self) -> u64 {
        self.consumed
    }
}

#[test]
fn writer_packs_msb_first() {
    let mut sink: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut sink);
    writer.put_code(9,0x41).expect("write err");
    writer.flush().expect("flush err");
    assert_eq!(writer.bytes_written(),2);
    assert_eq!(sink,vec![0x20,0x80]);
}

#[test]
fn mixed_width_roundtrip() {
    // widths total 48 bits so the stream ends on a byte boundary
    let codes: [(usize,u16);5] = [(9,257),(9,0x41),(10,600),(12,4095),(8,0xab)];
    let mut sink: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut sink);
    for (width,code) in codes {
        writer.put_code(width,code).expect("write err");
    }
    writer.flush().expect("flush err");
    let mut reader = BitReader::new(sink.as_slice());
    for (width,code) in codes {
        assert_eq!(reader.get_code(width).expect("read err"),Some(code));
    }
    assert_eq!(reader.get_code(9).expect("read err"),None);
    assert_eq!(reader.bytes_read(),6);
}

#[test]
fn eof_mid_code_is_an_error() {
    let data: [u8;1] = [0xff];
    let mut reader = BitReader::new(data.as_slice());
    assert!(reader.get_code(9).is_err());
}

#[test]
#[should_panic]
fn oversized_code_panics() {
    let mut sink: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut sink);
    writer.put_code(9,512).expect("write err");
}
