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

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Cause of a codec error.
#[derive(Debug, Clone)]
pub enum ParquetErrorCause {
    /// Truncated or garbled bytes at any framing layer.
    OutOfSpec,
    /// Valid input that uses an encoding, type or layout this codec does not implement.
    Unsupported,
    /// An index, offset or length that falls outside a buffer or a declared size.
    Bounds,
    /// An allocation could not be satisfied.
    Alloc(TryReserveError),
    /// A count that does not fit the width used on disk.
    Overflow,
    /// The caller broke a precondition: writer state, table shape or nullability.
    Layout,
    Utf8Decode(std::str::Utf8Error),
    Io(Arc<std::io::Error>),
}

impl ParquetErrorCause {
    pub fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParquetErrorCause::Alloc(err) => Some(err),
            ParquetErrorCause::Utf8Decode(err) => Some(err),
            ParquetErrorCause::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    #[track_caller]
    pub fn into_err(self) -> ParquetError {
        ParquetError::new(self)
    }
}

/// An error reading or writing a column file.
#[derive(Clone)]
pub struct ParquetError {
    /// What caused the error.
    cause: ParquetErrorCause,

    /// Initial message (if any) and
    /// stack of additional contextual information,
    /// printed in reverse order.
    context: Vec<String>,

    backtrace: Arc<Backtrace>,
}

impl ParquetError {
    #[track_caller]
    pub fn new(cause: ParquetErrorCause) -> Self {
        Self {
            cause,
            context: Vec::new(),
            backtrace: Backtrace::capture().into(),
        }
    }

    #[track_caller]
    pub fn with_descr(cause: ParquetErrorCause, descr: impl Into<String>) -> Self {
        Self {
            cause,
            context: vec![descr.into()],
            backtrace: Backtrace::capture().into(),
        }
    }

    pub fn cause(&self) -> &ParquetErrorCause {
        &self.cause
    }

    pub fn add_context(&mut self, context: impl Into<String>) {
        self.context.push(context.into());
    }

    /// Context outermost first, then the source error if there is one.
    fn fmt_msg(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut separator = "";
        for context in self.context.iter().rev() {
            write!(f, "{separator}{context}")?;
            separator = ": ";
        }
        match self.cause.source() {
            Some(source) => write!(f, "{separator}{source}"),
            None if self.context.is_empty() => write!(f, "{:?}", self.cause),
            None => Ok(()),
        }
    }
}

impl Display for ParquetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_msg(f)?;
        if let BacktraceStatus::Captured = &self.backtrace.status() {
            write!(f, "\n{:?}", self.backtrace)?;
        }
        Ok(())
    }
}

impl Debug for ParquetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ParquetError\n    Cause: {:?}", self.cause)?;
        writeln!(f, "    Context:")?;
        for line in self.context.iter().rev() {
            writeln!(f, "        {}", line)?;
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            writeln!(f, "    Backtrace:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParquetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.source()
    }
}

impl From<std::io::Error> for ParquetError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        ParquetErrorCause::Io(Arc::new(err)).into_err()
    }
}

impl From<TryReserveError> for ParquetError {
    #[track_caller]
    fn from(err: TryReserveError) -> Self {
        ParquetErrorCause::Alloc(err).into_err()
    }
}

impl From<std::str::Utf8Error> for ParquetError {
    #[track_caller]
    fn from(err: std::str::Utf8Error) -> Self {
        ParquetErrorCause::Utf8Decode(err).into_err()
    }
}

pub type ParquetResult<T> = Result<T, ParquetError>;

/// Adds context to the error of a [`ParquetResult`].
pub trait ParquetErrorExt<T> {
    fn context(self, context: &str) -> Self;

    /// Like [`Self::context`], computing the message only on error.
    fn with_context<F>(self, context: F) -> Self
    where
        F: FnOnce(&mut ParquetError) -> String;
}

impl<T> ParquetErrorExt<T> for ParquetResult<T> {
    fn context(self, context: &str) -> Self {
        self.map_err(|mut err| {
            err.add_context(context);
            err
        })
    }

    fn with_context<F>(self, context: F) -> Self
    where
        F: FnOnce(&mut ParquetError) -> String,
    {
        self.map_err(|mut err| {
            let message = context(&mut err);
            err.add_context(message);
            err
        })
    }
}

macro_rules! fmt_err {
    ($cause: ident, $($arg:tt)*) => {
        $crate::parquet::error::ParquetError::with_descr(
            $crate::parquet::error::ParquetErrorCause::$cause,
            format!($($arg)*))
    };
}

pub(crate) use fmt_err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_printed_outermost_first() {
        let res: ParquetResult<()> = Err(fmt_err!(OutOfSpec, "varint is truncated"));
        let err = res
            .context("could not read page header")
            .with_context(|_| "column \"id\" in row group 3".to_string())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with(
            "column \"id\" in row group 3: could not read page header: varint is truncated"
        ));
        assert!(matches!(err.cause(), ParquetErrorCause::OutOfSpec));
    }

    #[test]
    fn io_error_is_the_source() {
        let err: ParquetError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("short read"));
    }
}
