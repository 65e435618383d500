use crate::color::{self, MaybePaint};
use nu_ansi_term::AnsiGenericString;

pub const DEFAULT_EXIT_CODE: i32 = 1;

pub(crate) fn error_internal(text: &str) {
    let indicator: AnsiGenericString<'_, str> = color::ERROR_INDICATOR.maybe_paint("error:");
    let text: AnsiGenericString<'_, str> = color::ERROR_TEXT.maybe_paint(text);

    eprintln!("{} {}", indicator, text);
}

pub(crate) fn warn_internal(text: &str) {
    let indicator: AnsiGenericString<'_, str> = color::WARNING_INDICATOR.maybe_paint("warning:");
    let text: AnsiGenericString<'_, str> = color::WARNING_TEXT.maybe_paint(text);

    eprintln!("{} {}", indicator, text);
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::warn_internal(&formatted);
    })
}

#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
        ::std::process::exit($crate::utils::errors::DEFAULT_EXIT_CODE);
    })
}
