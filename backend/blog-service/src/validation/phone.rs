//! Phone number format rule.
//!
//! Numbers are parsed in the Iranian national context, so `0912...`,
//! `+98912...` and `+98 912 ...` all describe the same subscriber. Accepted
//! numbers are rewritten to E.164.

use super::FormatViolation;
use phonenumber::{country, Mode, PhoneNumber, Type};

pub const IR_MOBILE_CODE: &str = "phoneNumber.irMobile";
pub const BASE_CODE: &str = "phoneNumber.base";

const DEFAULT_REGION: country::Id = country::Id::IR;

const NOT_MOBILE: FormatViolation = FormatViolation {
    code: IR_MOBILE_CODE,
    message: "is not a valid mobile number!",
};

const UNPARSEABLE: FormatViolation = FormatViolation {
    code: BASE_CODE,
    message: "is not a valid phone number!",
};

fn is_mobile(number: &PhoneNumber) -> bool {
    matches!(
        number.number_type(&phonenumber::metadata::DATABASE),
        Type::Mobile | Type::FixedLineOrMobile
    )
}

/// Parse and canonicalize `value`.
///
/// With `mobile_only` the number must also be valid and on a mobile line.
/// Without it, any parseable number is accepted.
pub fn normalize(value: &str, mobile_only: bool) -> Result<String, FormatViolation> {
    let number = match phonenumber::parse(Some(DEFAULT_REGION), value) {
        Ok(number) => number,
        Err(_) if mobile_only => return Err(NOT_MOBILE),
        Err(_) => return Err(UNPARSEABLE),
    };

    if mobile_only && !(phonenumber::is_valid(&number) && is_mobile(&number)) {
        return Err(NOT_MOBILE);
    }

    Ok(number.format().mode(Mode::E164).to_string())
}
