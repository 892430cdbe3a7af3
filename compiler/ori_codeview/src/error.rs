//! Encoder errors.
//!
//! Every variant is a broken contract between the code generator and the
//! encoder. Data the format cannot represent (oversized lines, locations
//! without a scope) is dropped silently and never reaches this type.

use thiserror::Error;

use crate::machine::FunctionRef;
use crate::metadata::{LocRef, SubprogramRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeViewError {
    #[error("cannot begin {requested:?}: {active:?} is still being processed")]
    FunctionAlreadyActive {
        active: FunctionRef,
        requested: FunctionRef,
    },

    #[error("no function is being processed")]
    NoActiveFunction,

    #[error("cannot end {requested:?}: the active function is {active:?}")]
    FunctionMismatch {
        active: FunctionRef,
        requested: FunctionRef,
    },

    #[error("{0:?} was already processed in this module")]
    DuplicateFunction(FunctionRef),

    #[error("module ended while {0:?} is still being processed")]
    FunctionStillActive(FunctionRef),

    #[error("{0:?} has no end symbol")]
    MissingFunctionEnd(FunctionRef),

    #[error("symbol subsection of {0:?} exceeds 4 GiB")]
    SubsectionTooLarge(FunctionRef),

    #[error("file registration out of sync: assigned id {expected}, writer reports {registered} files")]
    FileRegistrationMismatch { expected: u32, registered: u32 },

    #[error("too many source files for one module")]
    TooManyFiles,

    #[error("inlinee {0:?} has no function id record")]
    UnknownInlinee(SubprogramRef),

    #[error("inline site at {0:?} is not in the function's site map")]
    MissingInlineSite(LocRef),

    #[error("location is not inlined; it has no inline site")]
    NotInlined,
}
