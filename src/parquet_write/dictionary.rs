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

//! Dictionary construction and the plain-versus-dictionary decision.

use std::collections::HashMap;
use std::str::FromStr;

use log::trace;

use crate::encoding::hybrid_rle::{encode_u32, num_bits_for};
use crate::encoding::Encoding;
use crate::page::DictPage;
use crate::parquet::error::{fmt_err, ParquetError, ParquetResult};
use crate::parquet_write::util::{encode_plain, PlainValue};

/// How a column chunk chooses between plain and dictionary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictionaryPolicy {
    /// Dictionary only when it is strictly smaller than plain.
    #[default]
    Auto,
    /// Dictionary whenever the chunk holds a non-null value.
    Always,
    Never,
}

impl FromStr for DictionaryPolicy {
    type Err = ParquetError;

    fn from_str(s: &str) -> ParquetResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DictionaryPolicy::Auto),
            "always" => Ok(DictionaryPolicy::Always),
            "never" => Ok(DictionaryPolicy::Never),
            _ => Err(fmt_err!(Layout, "unknown dictionary policy {s:?}")),
        }
    }
}

/// Maps distinct values to their first-seen position.
pub struct DictionaryBuilder<T: PlainValue> {
    positions: HashMap<T::Key, u32>,
    values: Vec<T>,
}

impl<T: PlainValue> DictionaryBuilder<T> {
    /// Sized for `num_rows` rows: twice the rows, rounded up to a power of two.
    pub fn with_capacity(num_rows: usize) -> Self {
        let capacity = num_rows.saturating_mul(2).checked_next_power_of_two().unwrap_or(num_rows);
        Self {
            positions: HashMap::with_capacity(capacity),
            values: Vec::new(),
        }
    }

    /// Position of `value`, inserting it if unseen.
    pub fn push(&mut self, value: T) -> u32 {
        let next = self.values.len() as u32;
        let position = *self.positions.entry(value.dictionary_key()).or_insert(next);
        if position == next {
            self.values.push(value);
        }
        position
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// The value stream of a data page and, when dictionary encoded, its dictionary page.
#[derive(Debug)]
pub struct EncodedValues {
    pub encoding: Encoding,
    pub buffer: Vec<u8>,
    pub dictionary: Option<DictPage>,
}

struct DictEncoded {
    dict: Vec<u8>,
    num_entries: usize,
    indices: Vec<u8>,
}

fn dictionary_encode<T: PlainValue>(values: &[T]) -> ParquetResult<DictEncoded> {
    if values.len() > u32::MAX as usize {
        return Err(fmt_err!(Overflow, "{} values exceed the dictionary index range", values.len()));
    }
    let mut builder = DictionaryBuilder::with_capacity(values.len());
    let keys: Vec<u32> = values.iter().map(|v| builder.push(*v)).collect();
    let num_entries = builder.len();
    let dict = encode_plain(builder.values())?;

    let num_bits = num_bits_for(num_entries.saturating_sub(1) as u32);
    let mut indices = Vec::new();
    encode_u32(&mut indices, keys.into_iter(), num_bits)?;
    Ok(DictEncoded {
        dict,
        num_entries,
        indices,
    })
}

/// Encodes the non-null `values` of one column chunk under `policy`.
pub fn encode_values<T: PlainValue>(
    column_name: &str,
    values: &[T],
    policy: DictionaryPolicy,
) -> ParquetResult<EncodedValues> {
    let use_plain = |buffer| EncodedValues {
        encoding: Encoding::Plain,
        buffer,
        dictionary: None,
    };
    let use_dict = |encoded: DictEncoded| EncodedValues {
        encoding: Encoding::RleDictionary,
        buffer: encoded.indices,
        dictionary: Some(DictPage {
            num_values: encoded.num_entries,
            buffer: encoded.dict,
        }),
    };

    if values.is_empty() || policy == DictionaryPolicy::Never {
        return Ok(use_plain(encode_plain(values)?));
    }
    let encoded = dictionary_encode(values)?;
    if policy == DictionaryPolicy::Always {
        return Ok(use_dict(encoded));
    }

    let plain_size: usize = values.iter().map(|v| v.plain_size()).sum();
    let dict_size = encoded.dict.len() + encoded.indices.len();
    trace!(
        "column {column_name:?}: plain {plain_size} bytes, dictionary {dict_size} bytes over {} entries",
        encoded.num_entries
    );
    if dict_size < plain_size {
        Ok(use_dict(encoded))
    } else {
        Ok(use_plain(encode_plain(values)?))
    }
}
