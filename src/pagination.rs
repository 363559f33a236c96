use crate::error::{BridgeError, Result};
use serde::Serialize;

/// Page/size/offset triple for one request.
///
/// `offset == (page_number - 1) * page_size` holds after every mutation.
/// A zero page size is rejected; a zero page number is clamped to 1. Pages
/// whose offset would not fit in a `usize` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    page_number: usize,
    page_size: usize,
    offset: usize,
}

impl PaginationInfo {
    pub fn new(page_number: usize, page_size: usize) -> Result<Self> {
        check_page_size(page_size)?;
        let mut info = PaginationInfo {
            page_number: 1,
            page_size,
            offset: 0,
        };
        info.set_page_number(page_number)?;
        Ok(info)
    }

    /// Seed from a storefront request's `from`/size pair.
    pub fn from_request(from: usize, size: usize) -> Result<Self> {
        let mut info = Self::new(1, size)?;
        info.set_offset(from)?;
        Ok(info)
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Fails, leaving `self` unchanged, when the page's offset does not fit
    /// in a `usize`.
    pub fn set_page_number(&mut self, page_number: usize) -> Result<()> {
        let page_number = page_number.max(1);
        self.offset = offset_of(page_number, self.page_size)?;
        self.page_number = page_number;
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        check_page_size(page_size)?;
        self.offset = offset_of(self.page_number, page_size)?;
        self.page_size = page_size;
        Ok(())
    }

    /// Floors to the page containing `offset`; the stored offset snaps to
    /// that page's first item.
    pub fn set_offset(&mut self, offset: usize) -> Result<()> {
        let page_number = (offset / self.page_size).checked_add(1).ok_or_else(|| {
            BridgeError::InvalidArgument(format!("offset {} is out of range", offset))
        })?;
        self.set_page_number(page_number)
    }

    /// Zero-based page index, as the engine expects it.
    pub fn engine_page(&self) -> usize {
        self.page_number - 1
    }
}

fn offset_of(page_number: usize, page_size: usize) -> Result<usize> {
    (page_number - 1).checked_mul(page_size).ok_or_else(|| {
        BridgeError::InvalidArgument(format!(
            "page {} of size {} is out of range",
            page_number, page_size
        ))
    })
}

fn check_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(BridgeError::InvalidArgument(
            "page size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
