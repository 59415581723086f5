//! Little-endian reader/writer and digit bit-packing

use phirac_core::{Error, PhiAdicNumber, ProbabilityModel, Result, Symbol};

/// Append-only byte sink
#[derive(Debug, Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_le_bytes());
    }

    pub fn model<S: Symbol>(&mut self, model: &ProbabilityModel<S>) {
        self.u32(model.len() as u32);
        for (symbol, p) in model.iter() {
            let bytes = symbol.to_bytes();
            self.u32(bytes.len() as u32);
            self.bytes(&bytes);
            self.f64(p);
        }
    }

    pub fn digits(&mut self, angle: &PhiAdicNumber) {
        let digits = angle.digits();
        self.u32(digits.len() as u32);
        self.bytes(&pack_digits(digits));
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked cursor over a container
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                Error::FormatError(format!(
                    "truncated {} at offset {} (need {} bytes, {} left)",
                    what,
                    self.pos,
                    n,
                    self.bytes.len() - self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn f64(&mut self, what: &str) -> Result<f64> {
        let b = self.take(8, what)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_bits(u64::from_le_bytes(raw)))
    }

    pub fn model<S: Symbol>(&mut self) -> Result<ProbabilityModel<S>> {
        let count = self.u32("model symbol count")? as usize;
        // Each entry needs at least 12 bytes; reject absurd counts before allocating
        if count > self.remaining() / 12 {
            return Err(Error::FormatError(format!(
                "model claims {} symbols but only {} bytes remain",
                count,
                self.remaining()
            )));
        }

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let len = self.u32("symbol length")? as usize;
            let symbol = S::from_bytes(self.take(len, "symbol bytes")?)?;
            let p = self.f64("probability")?;
            entries.push((symbol, p));
        }
        ProbabilityModel::new(entries).map_err(|e| Error::FormatError(format!("stored model: {}", e)))
    }

    pub fn digits(&mut self) -> Result<PhiAdicNumber> {
        let count = self.u32("digit count")? as usize;
        let packed = self.take(count.div_ceil(8), "digit bytes")?;
        unpack_digits(packed, count)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// One bit per digit, most significant digit in the high bit of byte 0
/// Bytes `Writer::model` produces for `model`
pub(crate) fn model_len<S: Symbol>(model: &ProbabilityModel<S>) -> usize {
    4 + model
        .iter()
        .map(|(symbol, _)| 4 + symbol.to_bytes().len() + 8)
        .sum::<usize>()
}

/// Bytes `Writer::digits` produces for `angle`
pub(crate) fn digits_len(angle: &PhiAdicNumber) -> usize {
    4 + angle.len().div_ceil(8)
}

pub(crate) fn pack_digits(digits: &[u8]) -> Vec<u8> {
    let mut packed = vec![0u8; digits.len().div_ceil(8)];
    for (i, &d) in digits.iter().enumerate() {
        if d == 1 {
            packed[i / 8] |= 0x80 >> (i % 8);
        }
    }
    packed
}

/// Inverse of [`pack_digits`], rejecting anything that is not a finished
/// canonical angle
pub(crate) fn unpack_digits(packed: &[u8], count: usize) -> Result<PhiAdicNumber> {
    let digits: Vec<u8> = (0..count)
        .map(|i| (packed[i / 8] >> (7 - i % 8)) & 1)
        .collect();

    if let Some(last) = packed.last() {
        let used = count % 8;
        if used != 0 && last & (0xff >> used) != 0 {
            return Err(Error::CorruptionError("nonzero padding bits after digits".into()));
        }
    }
    if digits.last() == Some(&0) {
        return Err(Error::CorruptionError("digit string ends in a zero".into()));
    }
    PhiAdicNumber::from_digits(digits).map_err(|e| Error::CorruptionError(e.to_string()))
}
