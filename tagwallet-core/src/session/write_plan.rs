// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Write Plans
//!
//! Page sequences written to a tag after patching. Fixed configuration
//! pages are kept as a literal table, separate from pages copied out of
//! the patched record.

use std::ops::{Range, RangeInclusive};

use crate::protocol::PageWrite;
use crate::record::{RecordError, TagRecord, PAGE_SIZE};

/// Data pages copied from the patched record in a full write.
pub const DATA_PAGES: RangeInclusive<u8> = 3..=129;

/// Pages rewritten by an application-data write.
pub const APP_DATA_PAGES: [RangeInclusive<u8>; 2] = [4..=12, 32..=129];

/// Content of a fixed page in the full write plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPage {
    Literal([u8; 4]),
    /// PWD_AUTH password of the patched UID.
    Password,
    /// UID check byte, internal byte, then the static lock bytes.
    LockBits,
}

/// Pages written after the data pages, in write order.
pub const FIXED_PAGES: [(u8, FixedPage); 6] = [
    (134, FixedPage::Literal([0x80, 0x80, 0x00, 0x00])), // PACK, RFUI
    (133, FixedPage::Password),
    (2, FixedPage::LockBits),
    (130, FixedPage::Literal([0x01, 0x00, 0x0F, 0x00])), // dynamic lock
    (131, FixedPage::Literal([0x00, 0x00, 0x00, 0x04])), // CFG0
    (132, FixedPage::Literal([0x5F, 0x00, 0x00, 0x00])), // CFG1
];

const STATIC_LOCK_VALUE: [u8; 2] = [0x0F, 0xE0];

/// Bytes of page 2 carried over from the patched record.
const LOCK_PAGE_COPIED: Range<usize> = 8..10;

fn record_page(record: &TagRecord, page: u8) -> Result<PageWrite, RecordError> {
    let data = record
        .page(page as usize)
        .ok_or(RecordError::Invariant("write plan page outside record"))?;
    Ok(PageWrite::new(page, data))
}

fn fixed_page(record: &TagRecord, page: u8, content: FixedPage) -> PageWrite {
    let data = match content {
        FixedPage::Literal(bytes) => bytes,
        FixedPage::Password => record.uid().password(),
        FixedPage::LockBits => {
            let bytes = record.as_bytes();
            [
                bytes[LOCK_PAGE_COPIED.start],
                bytes[LOCK_PAGE_COPIED.start + 1],
                STATIC_LOCK_VALUE[0],
                STATIC_LOCK_VALUE[1],
            ]
        }
    };
    PageWrite::new(page, data)
}

/// Full personalization: data pages, then the fixed table.
pub fn full_write_plan(patched: &TagRecord) -> Result<Vec<PageWrite>, RecordError> {
    let mut plan = Vec::with_capacity(DATA_PAGES.len() + FIXED_PAGES.len());
    for page in DATA_PAGES {
        plan.push(record_page(patched, page)?);
    }
    for (page, content) in FIXED_PAGES {
        plan.push(fixed_page(patched, page, content));
    }
    Ok(plan)
}

/// Application-data rewrite of an already personalized tag.
pub fn app_data_plan(patched: &TagRecord) -> Result<Vec<PageWrite>, RecordError> {
    let mut plan = Vec::new();
    for range in APP_DATA_PAGES {
        for page in range {
            plan.push(record_page(patched, page)?);
        }
    }
    Ok(plan)
}

/// The tag image after `plan` has been written over `image`.
///
/// Pages past the end of `image` are ignored.
pub fn apply_plan(image: &TagRecord, plan: &[PageWrite]) -> Result<TagRecord, RecordError> {
    let mut bytes = image.as_bytes().to_vec();
    for write in plan {
        let offset = write.page as usize * PAGE_SIZE;
        if let Some(slot) = bytes.get_mut(offset..offset + PAGE_SIZE) {
            slot.copy_from_slice(&write.data);
        }
    }
    TagRecord::new(bytes)
}

// INLINE_TEST_REQUIRED: Tests private STATIC_LOCK_VALUE and LOCK_PAGE_COPIED constants
#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TagRecord {
        let bytes: Vec<u8> = (0..532u32).map(|i| (i / 4) as u8).collect();
        TagRecord::new(bytes).unwrap()
    }

    #[test]
    fn test_full_plan_order() {
        let plan = full_write_plan(&record()).unwrap();
        let pages: Vec<u8> = plan.iter().map(|w| w.page).collect();
        assert_eq!(pages.len(), 127 + 6);
        assert_eq!(pages[0], 3);
        assert_eq!(pages[126], 129);
        assert_eq!(&pages[127..], &[134, 133, 2, 130, 131, 132]);
    }

    #[test]
    fn test_lock_page_copies_bytes_8_and_9() {
        let record = record();
        let plan = full_write_plan(&record).unwrap();
        let lock = plan.iter().find(|w| w.page == 2).unwrap();
        let bytes = record.as_bytes();
        assert_eq!(LOCK_PAGE_COPIED, 8..10);
        assert_eq!(STATIC_LOCK_VALUE, [0x0F, 0xE0]);
        assert_eq!(lock.data, [bytes[8], bytes[9], 0x0F, 0xE0]);
    }

    #[test]
    fn test_apply_plan_sets_lock_bytes_and_skips_missing_pages() {
        let record = record();
        let plan = full_write_plan(&record).unwrap();
        let written = apply_plan(&record, &plan).unwrap();

        assert_eq!(written.len(), 532);
        assert!(written.is_locked());
        assert_eq!(written.page(130), Some([0x01, 0x00, 0x0F, 0x00]));
        // Pages 133 and 134 lie past a 532-byte image
        assert_eq!(written.page(133), None);
    }

    #[test]
    fn test_app_data_plan_covers_two_ranges() {
        let plan = app_data_plan(&record()).unwrap();
        assert_eq!(plan.len(), 9 + 98);
        assert_eq!(plan[8].page, 12);
        assert_eq!(plan[9].page, 32);
        // Page content is copied verbatim
        assert_eq!(plan[9].data, [32, 32, 32, 32]);
    }
}
