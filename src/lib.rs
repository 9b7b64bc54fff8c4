/*******************************************************************************
 *     ___                  _   ____  ____
 *    / _ \ _   _  ___  ___| |_|  _ \| __ )
 *   | | | | | | |/ _ \/ __| __| | | |  _ \
 *   | |_| | |_| |  __/\__ \ |_| |_| | |_) |
 *    \__\_\\__,_|\___||___/\__|____/|____/
 *
 *  Copyright (c) 2014-2019 Appsicle
 *  Copyright (c) 2019-2026 QuestDB
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *  http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 *
 ******************************************************************************/

//! A columnar file codec.
//!
//! Tables are written as row groups of column chunks, each chunk an optional
//! dictionary page followed by one data page, framed with the compact protocol
//! and closed by a footer holding the file metadata. The reader parses the
//! footer once and decodes column chunks on demand.

pub mod compression;
pub mod encoding;
pub mod format;
pub mod page;
pub mod parquet;
pub mod parquet_read;
pub mod parquet_write;
pub mod table;
pub mod thrift;

pub use parquet::error::{ParquetError, ParquetErrorCause, ParquetErrorExt, ParquetResult};
