//! Record-code dispatch table (§4.3).
//!
//! Ordered roughly by expected frequency — TR family first, then
//! PIR/PRR, then wafer/bin, then MIR/WCR/PCR — a documented
//! micro-optimization carried over verbatim from the design.

use crate::codec::records::{self, TypedRecord};
use crate::codec::{record_codes, Endian};

use super::{handlers, State, SummarizeError};

pub(super) fn handle(
    state: &mut State,
    record_code: u16,
    file_offset: u64,
    bytes: &[u8],
    raw_len: u16,
    endian: Endian,
) -> Result<(), SummarizeError> {
    let typed = records::decode(record_code, bytes, endian)?;

    match typed {
        TypedRecord::Ptr(ptr) => handlers::tr_family(state, ptr.header, ptr.meta, record_code, file_offset, raw_len),
        TypedRecord::Mpr(mpr) => handlers::tr_family(state, mpr.header, mpr.meta, record_code, file_offset, raw_len),
        TypedRecord::Ftr(ftr) => handlers::tr_family(
            state,
            ftr.header,
            records::TestMeta {
                test_txt: ftr.test_txt,
                ..Default::default()
            },
            record_code,
            file_offset,
            raw_len,
        ),
        TypedRecord::Pir(pir) => handlers::pir(state, pir),
        TypedRecord::Prr(prr) => handlers::prr(state, prr),
        TypedRecord::Wir(wir) => handlers::wir(state, wir),
        TypedRecord::Wrr(wrr) => handlers::wrr(state, wrr),
        TypedRecord::Hbr(bin) => handlers::bin_record(state, bin, record_codes::HBR),
        TypedRecord::Sbr(bin) => handlers::bin_record(state, bin, record_codes::SBR),
        TypedRecord::Tsr(tsr) => handlers::tsr(state, tsr),
        TypedRecord::Mir(mir) => handlers::mir(state, mir, endian),
        TypedRecord::Wcr(wcr) => handlers::wcr(state, wcr),
        TypedRecord::Pcr(pcr) => handlers::pcr(state, pcr),
        TypedRecord::Pmr(_) => Ok(()),
    }
}
