//! LZW Compression
//!
//! Byte oriented LZW with variable code widths.  Codes start 9 bits wide
//! and grow to 12 as phrases accumulate; when all 4096 codes are spoken
//! for the compressor emits the clear code and both sides start over.
//! The compressor's dictionary is a trie keyed by `(u16,u8)`, i.e. the
//! code of a phrase's prefix plus one extension byte, so lookups never
//! touch the phrase bytes themselves.

use std::io::{Cursor,Read,Write,BufReader,BufWriter,ErrorKind};
use std::collections::HashMap;
use crate::tools::bits::{BitReader,BitWriter};
use crate::DYNERR;
use crate::Error;

/// code that clears the dictionary and resets the code width
pub const CLEAR_CODE: u16 = 256;
/// code that terminates the stream
pub const STOP_CODE: u16 = 257;

const FIRST_FREE_CODE: u16 = 258;
const MAX_CODE: u16 = 4095;
const MIN_CODE_WIDTH: usize = 9;
const MAX_CODE_WIDTH: usize = 12;

/// number of bits in the binary representation of `code`
fn bit_width(code: u16) -> usize {
    (16 - code.leading_zeros()) as usize
}

/// Maps phrases to codes during compression.  A phrase is identified by
/// the code of its prefix and one extension byte, single bytes are their
/// own codes and are never stored.
struct EncoderDictionary {
    trie: HashMap<(u16,u8),u16>,
    last_code: u16
}

impl EncoderDictionary {
    fn new() -> Self {
        Self {
            trie: HashMap::new(),
            last_code: STOP_CODE
        }
    }
    /// code of the phrase formed by extending `prefix` with `sym`, if any
    fn lookup(&self,prefix: u16,sym: u8) -> Option<u16> {
        self.trie.get(&(prefix,sym)).copied()
    }
    /// assign the next free code to the extension of `prefix` by `sym`
    fn add(&mut self,prefix: u16,sym: u8) -> Result<u16,Error> {
        if self.last_code == MAX_CODE {
            return Err(Error::DictionaryFull);
        }
        self.last_code += 1;
        self.trie.insert((prefix,sym),self.last_code);
        Ok(self.last_code)
    }
    /// true when every code is assigned, the next add would need 13 bits
    fn will_overflow(&self) -> bool {
        self.last_code == MAX_CODE
    }
    fn clear(&mut self) {
        self.trie.clear();
        self.last_code = STOP_CODE;
    }
}

/// Maps codes back to phrases during expansion.  Dynamic codes are stored
/// as (prefix code, suffix byte) pairs and phrases are materialized by
/// walking the prefix links back to a root byte.
struct DecoderDictionary {
    /// entry i holds the pair for code FIRST_FREE_CODE + i
    entries: Vec<(u16,u8)>,
    last_code: u16
}

impl DecoderDictionary {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_code: STOP_CODE
        }
    }
    /// true for any assigned code, the two reserved codes excluded
    fn contains(&self,code: u16) -> bool {
        code < CLEAR_CODE || (code >= FIRST_FREE_CODE && code <= self.last_code)
    }
    /// leading byte of the phrase for `code`
    fn first_byte(&self,code: u16) -> u8 {
        let mut c = code;
        while c >= FIRST_FREE_CODE {
            c = self.entries[(c - FIRST_FREE_CODE) as usize].0;
        }
        c as u8
    }
    /// Walk back through the prefix links to form the phrase, the bytes
    /// come out in reverse order and are flipped at the end.
    fn phrase(&self,code: u16) -> Vec<u8> {
        let mut rev = Vec::new();
        let mut c = code;
        while c >= FIRST_FREE_CODE {
            let (prefix,sym) = self.entries[(c - FIRST_FREE_CODE) as usize];
            rev.push(sym);
            c = prefix;
        }
        rev.push(c as u8);
        rev.iter().rev().map(|x| *x).collect()
    }
    /// assign the next free code to the phrase `prefix` extended by `sym`
    fn add(&mut self,prefix: u16,sym: u8) -> Result<u16,Error> {
        if self.last_code == MAX_CODE {
            return Err(Error::DictionaryFull);
        }
        self.last_code += 1;
        self.entries.push((prefix,sym));
        Ok(self.last_code)
    }
    /// True right after the add that tops out the current code width,
    /// i.e. when the last code is all ones.  The writing side is one add
    /// ahead, so its next code is already a bit wider.
    fn fills_width(&self) -> bool {
        self.last_code & (self.last_code + 1) == 0
    }
    fn clear(&mut self) {
        self.entries.clear();
        self.last_code = STOP_CODE;
    }
}

/// Read a bootstrap code, which must name a single byte.  Used for the
/// first code of the stream and the first code after a clear.
/// Returns None only if the source is exhausted.
fn bootstrap_code<R: Read>(reader: &mut BitReader<R>) -> Result<Option<u16>,DYNERR> {
    match reader.get_code(MIN_CODE_WIDTH) {
        Ok(Some(code)) if code < CLEAR_CODE => Ok(Some(code)),
        Ok(Some(code)) => {
            log::error!("expected a raw byte code, got {}",code);
            Err(Box::new(Error::InvalidCode))
        },
        Ok(None) => Ok(None),
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => Err(Box::new(Error::TruncatedStream)),
        Err(e) => Err(Box::new(e))
    }
}

/// Main compression function.
/// `expanded_in` is an object with the `Read` trait, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W) -> Result<(u64,u64),DYNERR>
where R: Read, W: Write {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BitWriter::new(BufWriter::new(compressed_out));
    let mut dict = EncoderDictionary::new();
    let mut width = MIN_CODE_WIDTH;
    let mut in_size: u64 = 0;
    let mut sym_in: [u8;1] = [0];

    // the phrase being matched is carried as its code
    let mut curr: u16 = match reader.read_exact(&mut sym_in) {
        Ok(()) => {
            in_size += 1;
            sym_in[0] as u16
        },
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            // empty input becomes an empty stream, not even a stop code
            return Ok((0,0));
        },
        Err(e) => return Err(Box::new(e))
    };

    log::debug!("entering symbol loop");
    loop {
        match reader.read_exact(&mut sym_in) {
            Ok(()) => {
                in_size += 1;
                let sym = sym_in[0];
                if let Some(code) = dict.lookup(curr,sym) {
                    // phrase extends, keep matching
                    curr = code;
                    continue;
                }
                log::trace!("code: {}",curr);
                writer.put_code(width,curr)?;
                if dict.will_overflow() {
                    // no codes left, signal a reset instead of adding
                    log::debug!("dictionary full at {} bytes in, clearing",in_size);
                    writer.put_code(width,CLEAR_CODE)?;
                    dict.clear();
                    width = MIN_CODE_WIDTH;
                } else {
                    let new_code = dict.add(curr,sym)?;
                    if bit_width(new_code) > width {
                        width += 1;
                        log::debug!("write width grows to {}",width);
                    }
                }
                curr = sym as u16;
            },
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Box::new(e))
        }
    }
    log::trace!("code: {}",curr);
    writer.put_code(width,curr)?;
    writer.put_code(width,STOP_CODE)?;
    writer.flush()?;
    Ok((in_size,writer.bytes_written()))
}

/// Main expansion function.
/// `compressed_in` is an object with the `Read` trait, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W) -> Result<(u64,u64),DYNERR>
where R: Read, W: Write {
    let mut reader = BitReader::new(BufReader::new(compressed_in));
    let mut writer = BufWriter::new(expanded_out);
    let mut dict = DecoderDictionary::new();
    let mut width = MIN_CODE_WIDTH;
    let mut out_size: u64 = 0;

    let mut prev: u16 = match bootstrap_code(&mut reader)? {
        Some(code) => code,
        None => {
            // empty stream expands to empty output
            return Ok((0,0));
        }
    };

    log::debug!("entering code loop");
    loop {
        let code = match reader.get_code(width) {
            Ok(Some(c)) => c,
            Ok(None) => return Err(Box::new(Error::TruncatedStream)),
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => return Err(Box::new(Error::TruncatedStream)),
            Err(e) => return Err(Box::new(e))
        };
        if code == STOP_CODE {
            break;
        }
        // the previously decoded phrase is settled, write it out
        let phrase = dict.phrase(prev);
        log::trace!("write {} as {:?}",prev,phrase);
        writer.write_all(&phrase)?;
        out_size += phrase.len() as u64;
        if code == CLEAR_CODE {
            log::debug!("clear code found, resetting");
            dict.clear();
            width = MIN_CODE_WIDTH;
            prev = match bootstrap_code(&mut reader)? {
                Some(c) => c,
                None => return Err(Box::new(Error::TruncatedStream))
            };
            continue;
        }
        if dict.contains(code) {
            let ext = dict.first_byte(code);
            dict.add(prev,ext)?;
            prev = code;
        } else if code == dict.last_code + 1 {
            // the phrase starts with itself, rebuild it from the previous one
            let ext = dict.first_byte(prev);
            prev = dict.add(prev,ext)?;
        } else {
            log::error!("bad code, expected at most {}, got {}",dict.last_code + 1,code);
            return Err(Box::new(Error::InvalidCode));
        }
        if dict.fills_width() && width < MAX_CODE_WIDTH {
            width += 1;
            log::debug!("read width grows to {}",width);
        }
    }
    let phrase = dict.phrase(prev);
    log::trace!("write {} as {:?}",prev,phrase);
    writer.write_all(&phrase)?;
    out_size += phrase.len() as u64;
    writer.flush()?;
    Ok((reader.bytes_read(),out_size))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8]) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8]) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans)?;
    Ok(ans.into_inner())
}


// *************** TESTS *****************

/// read a stream back as raw codes, tracking widths the way the expander does
#[cfg(test)]
fn scan_codes(stream: &[u8]) -> Vec<u16> {
    let mut reader = BitReader::new(stream);
    let mut codes = Vec::new();
    let mut width = MIN_CODE_WIDTH;
    let mut last_code = STOP_CODE;
    let mut bootstrap = true;
    loop {
        let code = match reader.get_code(width).expect("scan failed") {
            Some(c) => c,
            None => break
        };
        codes.push(code);
        if code == STOP_CODE {
            break;
        }
        if code == CLEAR_CODE {
            width = MIN_CODE_WIDTH;
            last_code = STOP_CODE;
            bootstrap = true;
            continue;
        }
        if bootstrap {
            // the code right after a reset carries no insertion
            bootstrap = false;
            continue;
        }
        last_code += 1;
        if last_code & (last_code + 1) == 0 && width < MAX_CODE_WIDTH {
            width += 1;
        }
    }
    codes
}

/// deterministic shapeless bytes for dictionary stress tests
#[cfg(test)]
fn lcg_bytes(count: usize) -> Vec<u8> {
    let mut ans = Vec::with_capacity(count);
    let mut state: u32 = 1;
    for _i in 0..count {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        ans.push((state >> 16) as u8);
    }
    ans
}

#[test]
fn compression_works() {
    // Example adapted from wikipedia; in their example there are 26 symbols and # is a stop code.
    // Here # and newline are ordinary symbols, and every code here fits in 9 bits.
    let test_data = "TOBEORNOTTOBEORTOBEORNOT#\n".as_bytes();
    let lzw_str = "2A 13 C8 44 52 79 48 9C 4F 2A 40 A0 90 68 5C 16 0F 09 11 82 A0 20";
    let compressed = compress_slice(test_data).expect("compression failed");
    assert_eq!(compressed,hex::decode(lzw_str.replace(" ","")).unwrap());
}

#[test]
fn expansion_works() {
    let lzw_str = "2A 13 C8 44 52 79 48 9C 4F 2A 40 A0 90 68 5C 16 0F 09 11 82 A0 20";
    let expanded = expand_slice(&hex::decode(lzw_str.replace(" ","")).unwrap()).expect("expansion failed");
    assert_eq!(expanded,"TOBEORNOTTOBEORTOBEORNOT#\n".as_bytes());
}

#[test]
fn two_symbol_file() {
    let compressed = compress_slice("AB".as_bytes()).expect("compression failed");
    assert_eq!(compressed,hex::decode("2090A020").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"AB".as_bytes());
}

#[test]
fn single_symbol_file() {
    // one 9 bit code, one 9 bit stop code, 6 bits of padding, 3 bytes in all
    let compressed = compress_slice("A".as_bytes()).expect("compression failed");
    assert_eq!(compressed,hex::decode("20C040").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"A".as_bytes());
}

#[test]
fn alternating_symbols() {
    let compressed = compress_slice("ABABABA".as_bytes()).expect("compression failed");
    assert_eq!(compressed,hex::decode("2090A0504808").unwrap());
    assert_eq!(scan_codes(&compressed),vec![65,66,258,260,STOP_CODE]);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"ABABABA".as_bytes());
}

#[test]
fn run_of_one_symbol() {
    // codes 258 and 259 arrive before the expander has stored them and
    // must be rebuilt from the previous phrase
    let compressed = compress_slice("AAAAAAA".as_bytes()).expect("compression failed");
    assert_eq!(compressed,hex::decode("20C0A0641808").unwrap());
    assert_eq!(scan_codes(&compressed),vec![65,258,259,65,STOP_CODE]);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"AAAAAAA".as_bytes());
}

#[test]
fn high_symbols_pack() {
    let compressed = compress_slice(&[0xff,0xff]).expect("compression failed");
    assert_eq!(compressed,hex::decode("7FBFE020").unwrap());
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,&[0xff,0xff]);
}

#[test]
fn empty_file() {
    let compressed = compress_slice(&[]).expect("compression failed");
    assert_eq!(compressed,Vec::<u8>::new());
    let expanded = expand_slice(&[]).expect("expansion failed");
    assert_eq!(expanded,Vec::<u8>::new());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data).expect("compression failed");
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_all_byte_values() {
    let test_data: Vec<u8> = (0..=255).collect();
    let compressed = compress_slice(&test_data).expect("compression failed");
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn invertibility_with_clear() {
    // enough shapeless data to assign all 4096 codes several times over
    let test_data = lcg_bytes(65536);
    let compressed = compress_slice(&test_data).expect("compression failed");
    let codes = scan_codes(&compressed);
    assert!(codes.contains(&CLEAR_CODE));
    assert_eq!(*codes.last().unwrap(),STOP_CODE);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn truncated_stream_fails() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data).expect("compression failed");
    let cut = &compressed[0..compressed.len()-2];
    assert!(expand_slice(cut).is_err());
}

#[test]
fn corrupt_code_fails_or_differs() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let mut compressed = compress_slice(test_data).expect("compression failed");
    compressed[10] ^= 0x10;
    // either a decode error or a different output, never a hang or a false match
    match expand_slice(&compressed) {
        Ok(expanded) => assert_ne!(expanded,test_data.to_vec()),
        Err(_) => {}
    }
}
