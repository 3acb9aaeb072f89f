//! Big-endian, length-prefixed primitives shared by the certificate and
//! storage-address encodings.

use crate::CertificateError;

/// Texts carry a 2-byte length prefix.
pub(crate) const MAX_TEXT_LEN: usize = u16::MAX as usize;

pub(crate) fn check_text(field: &'static str, value: &str) -> Result<(), CertificateError> {
    if value.len() > MAX_TEXT_LEN {
        return Err(CertificateError::FieldTooLong {
            field,
            len: value.len(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

#[derive(Default)]
pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Callers validate lengths with [`check_text`] when the value is built.
    pub(crate) fn put_text(&mut self, value: &str) {
        debug_assert!(value.len() <= MAX_TEXT_LEN);
        self.buf
            .extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub(crate) fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn put_bytes(&mut self, value: &[u8]) {
        self.buf
            .extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(value);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], CertificateError> {
        if self.buf.len() < n {
            return Err(CertificateError::Malformed {
                field,
                reason: format!("truncated: need {} bytes, {} remain", n, self.buf.len()),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CertificateError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub(crate) fn text(&mut self, field: &'static str) -> Result<String, CertificateError> {
        let len = u16::from_be_bytes(self.array(field)?) as usize;
        let raw = self.take(field, len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| CertificateError::Malformed {
            field,
            reason: format!("invalid UTF-8: {}", e),
        })
    }

    pub(crate) fn i64(&mut self, field: &'static str) -> Result<i64, CertificateError> {
        Ok(i64::from_be_bytes(self.array(field)?))
    }

    pub(crate) fn i32(&mut self, field: &'static str) -> Result<i32, CertificateError> {
        Ok(i32::from_be_bytes(self.array(field)?))
    }

    pub(crate) fn bytes(&mut self, field: &'static str) -> Result<Vec<u8>, CertificateError> {
        let len = u32::from_be_bytes(self.array(field)?) as usize;
        Ok(self.take(field, len)?.to_vec())
    }

    /// Fails if any input is left over.
    pub(crate) fn finish(self) -> Result<(), CertificateError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CertificateError::Malformed {
                field: "trailer",
                reason: format!("{} unexpected trailing bytes", self.buf.len()),
            })
        }
    }
}
