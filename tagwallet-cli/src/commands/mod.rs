// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Commands

pub mod inspect;
pub mod keys;
pub mod password;
pub mod patch;
#[cfg(feature = "pcsc")]
pub mod reader;
