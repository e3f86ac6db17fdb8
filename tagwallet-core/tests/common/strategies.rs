// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies

use proptest::prelude::*;

/// Strategy for 9-byte tag UIDs.
pub fn uid_strategy() -> impl Strategy<Value = [u8; 9]> {
    prop::array::uniform9(any::<u8>())
}

/// Strategy for 32-byte keygen salts.
pub fn salt_strategy() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strategy for valid record lengths.
pub fn record_len_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(532usize), Just(540usize), Just(572usize)]
}

/// Strategy for lengths no record may have.
pub fn invalid_len_strategy() -> impl Strategy<Value = usize> {
    (0usize..1024).prop_filter("valid record length", |n| ![532, 540, 572].contains(n))
}
