//! TN3270E Integration Tests
//!
//! Device type and function negotiation against scripted hosts, covering
//! LU selection, host initiated function lists, rejection and fallback to
//! basic TN3270.

mod utils;

use tn3270r::error::NegotiationError;
use tn3270r::lib3270::codes::{Tn3270eFunction, REASON_INV_DEVICE_TYPE};
use tn3270r::lib3270::Tn3270eHeader;
use tn3270r::telnet_negotiation::Tn3270ePhase;
use tn3270r::{SessionConfig, TN3270Error};
use utils::*;

#[test]
fn test_lu_name_is_requested() {
    let config = SessionConfig::default().with_lu_name("LU000042");
    let mut steps = tn3270e_host_steps();
    steps[2] = ready(&device_type_is("IBM-3278-2-E", "LU000042"));
    let (mut telnet, log) = scripted_session(config, steps);

    telnet.negotiate().unwrap();

    let mut request = vec![0x02, 0x07];
    request.extend_from_slice(b"IBM-3278-2-E");
    request.push(0x01);
    request.extend_from_slice(b"LU000042");
    assert_eq!(log.borrow().sent[1], sb(0x28, &request));
    assert_eq!(telnet.device_name(), Some("LU000042"));
}

#[test]
fn test_configured_functions_are_requested() {
    let mut config = SessionConfig::default();
    config.functions = vec![Tn3270eFunction::Responses, Tn3270eFunction::Sysreq];
    let mut steps = tn3270e_host_steps();
    steps[3] = ready(&sb(0x28, &[0x03, 0x04, 0x02]));
    let (mut telnet, log) = scripted_session(config, steps);

    telnet.negotiate().unwrap();

    assert_eq!(log.borrow().sent[2], sb(0x28, &[0x03, 0x07, 0x02, 0x04]));
    assert_eq!(telnet.negotiator().functions(), &[0x02]);
}

#[test]
fn test_host_functions_request_is_accepted() {
    let mut steps = tn3270e_host_steps();
    steps[3] = ready(&sb(0x28, &[0x03, 0x07, 0x00, 0x02]));
    let (mut telnet, log) = scripted_session(SessionConfig::default(), steps);

    telnet.negotiate().unwrap();

    assert!(telnet.is_tn3270e_negotiated());
    assert_eq!(log.borrow().sent.last().unwrap(), &sb(0x28, &[0x03, 0x04, 0x00, 0x02]));
}

#[test]
fn test_host_will_tn3270e() {
    let mut steps = tn3270e_host_steps();
    steps[0] = ready(&[0xff, 0xfb, 0x28]);
    let (mut telnet, log) = scripted_session(SessionConfig::default(), steps);

    telnet.negotiate().unwrap();

    assert_eq!(log.borrow().sent[0], vec![0xff, 0xfd, 0x28]);
    assert!(telnet.is_tn3270e_negotiated());
}

#[test]
fn test_device_type_rejected() {
    let mut steps = tn3270e_host_steps();
    steps[2] = ready(&sb(0x28, &[0x02, 0x06, 0x05, REASON_INV_DEVICE_TYPE]));
    let (mut telnet, _log) = scripted_session(SessionConfig::default(), steps);

    let err = telnet.negotiate().unwrap_err();

    match err {
        TN3270Error::NegotiationFailed(NegotiationError::DeviceTypeRejected { reason, .. }) => {
            assert_eq!(reason, REASON_INV_DEVICE_TYPE);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_malformed_device_type_is() {
    let mut steps = tn3270e_host_steps();
    steps[2] = ready(&sb(0x28, &[0x02, 0x04]));
    let (mut telnet, _log) = scripted_session(SessionConfig::default(), steps);

    let err = telnet.negotiate().unwrap_err();

    assert!(matches!(
        err,
        TN3270Error::NegotiationFailed(NegotiationError::MalformedSubnegotiation {
            option: 0x28,
            ..
        })
    ));
}

#[test]
fn test_fallback_when_host_withdraws_tn3270e() {
    let mut steps = vec![ready(&[0xff, 0xfd, 0x28]), ready(&[0xff, 0xfe, 0x28])];
    steps.extend(basic_host_steps());
    let (mut telnet, log) = scripted_session(SessionConfig::default(), steps);

    telnet.negotiate().unwrap();

    assert!(telnet.is_tn3270_negotiated());
    assert!(!telnet.is_tn3270e_negotiated());
    assert_eq!(telnet.negotiator().tn3270e_phase(), Tn3270ePhase::Inactive);
    assert_eq!(&log.borrow().sent[..2], &[vec![0xff, 0xfb, 0x28], vec![0xff, 0xfc, 0x28]]);
}

#[test]
fn test_outbound_header_layout() {
    assert_eq!(Tn3270eHeader::data().to_bytes(), [0x00; 5]);
}
