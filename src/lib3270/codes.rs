/// TN3270E Protocol Constants and Codes
///
/// This module contains the subnegotiation codes, header data types and
/// function codes used by TN3270E sessions as specified in RFC 2355.
///
/// # References
/// - RFC 1576: TN3270 Current Practices
/// - RFC 2355: TN3270 Enhancements

/// TN3270E Subnegotiation Codes
///
/// These appear inside `IAC SB TN3270E ... IAC SE`
pub const TN3270E_CONNECT: u8 = 0x01;     // CONNECT <resource-name>
pub const TN3270E_DEVICE_TYPE: u8 = 0x02; // DEVICE-TYPE subcommand
pub const TN3270E_FUNCTIONS: u8 = 0x03;   // FUNCTIONS subcommand
pub const TN3270E_IS: u8 = 0x04;          // IS
pub const TN3270E_REASON: u8 = 0x05;      // REASON <reason-code>
pub const TN3270E_REJECT: u8 = 0x06;      // REJECT
pub const TN3270E_REQUEST: u8 = 0x07;     // REQUEST
pub const TN3270E_SEND: u8 = 0x08;        // SEND

/// Data type of outbound 3270 records
pub const DATA_TYPE_3270_DATA: u8 = 0x00;

/// Length of the TN3270E record header
pub const TN3270E_HEADER_LEN: usize = 5;

/// TN3270E Reason Codes (sent with DEVICE-TYPE REJECT)
pub const REASON_CONN_PARTNER: u8 = 0x00;
pub const REASON_DEVICE_IN_USE: u8 = 0x01;
pub const REASON_INV_ASSOCIATE: u8 = 0x02;
pub const REASON_INV_DEVICE_NAME: u8 = 0x03;
pub const REASON_INV_DEVICE_TYPE: u8 = 0x04;
pub const REASON_TYPE_NAME_ERROR: u8 = 0x05;
pub const REASON_UNKNOWN_ERROR: u8 = 0x06;
pub const REASON_UNSUPPORTED_REQ: u8 = 0x07;

/// TN3270E function codes negotiated with FUNCTIONS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Tn3270eFunction {
    BindImage = 0x00,
    DataStreamCtl = 0x01,
    Responses = 0x02,
    ScsCtlCodes = 0x03,
    Sysreq = 0x04,
}

impl Tn3270eFunction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Tn3270eFunction::BindImage),
            0x01 => Some(Tn3270eFunction::DataStreamCtl),
            0x02 => Some(Tn3270eFunction::Responses),
            0x03 => Some(Tn3270eFunction::ScsCtlCodes),
            0x04 => Some(Tn3270eFunction::Sysreq),
            _ => None,
        }
    }
}

/// Get a human readable description of a DEVICE-TYPE REJECT reason code
pub fn reason_description(code: u8) -> &'static str {
    match code {
        REASON_CONN_PARTNER => "connection partner",
        REASON_DEVICE_IN_USE => "device in use",
        REASON_INV_ASSOCIATE => "invalid associate",
        REASON_INV_DEVICE_NAME => "invalid device name",
        REASON_INV_DEVICE_TYPE => "invalid device type",
        REASON_TYPE_NAME_ERROR => "device type and name mismatch",
        REASON_UNKNOWN_ERROR => "unknown error",
        REASON_UNSUPPORTED_REQ => "unsupported request",
        _ => "unrecognized reason",
    }
}

/// Get the TN3270E device type to request for a terminal type
///
/// TN3270E only defines 3278 models; color support is implied by the `-E`
/// suffix, so a 3279 terminal type is requested as the matching 3278 model.
pub fn tn3270e_device_type(terminal_type: &str) -> String {
    match terminal_type.strip_prefix("IBM-3279-") {
        Some(model) => format!("IBM-3278-{model}"),
        None => terminal_type.to_string(),
    }
}
