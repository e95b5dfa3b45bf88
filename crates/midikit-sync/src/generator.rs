//! MTC generation: the mirror image of the receiver.

use crate::timecode::{MtcRate, Timecode};
use midikit_core::event::{MidiEvent, SysExMsg, SystemCommonMsg, UniversalKind};
use midikit_core::num::{U4, U7};

/// The eight quarter-frame events spelling out `timecode`, piece 0 first.
///
/// A transmitter sends these over two frames, four per frame; the
/// timecode should be the value at the moment piece 0 is sent.
pub fn quarter_frames(timecode: &Timecode, rate: MtcRate, group: U4) -> [MidiEvent; 8] {
    let nibbles = [
        timecode.frames & 0x0F,
        (timecode.frames >> 4) & 0x01,
        timecode.seconds & 0x0F,
        (timecode.seconds >> 4) & 0x03,
        timecode.minutes & 0x0F,
        (timecode.minutes >> 4) & 0x03,
        timecode.hours & 0x0F,
        ((timecode.hours >> 4) & 0x01) | (rate.code() << 1),
    ];
    core::array::from_fn(|piece| MidiEvent::SystemCommon {
        group,
        msg: SystemCommonMsg::TimecodeQuarterFrame {
            data: U7::new(((piece as u8) << 4) | nibbles[piece]),
        },
    })
}

/// The full-frame universal SysEx (`F0 7F dev 01 01 hh mm ss ff F7`)
/// carrying `timecode`.
pub fn full_frame(timecode: &Timecode, rate: MtcRate, device_id: U7) -> MidiEvent {
    MidiEvent::SysEx(SysExMsg::UniversalSysEx7 {
        group: U4::MIN,
        kind: UniversalKind::Realtime,
        device_id,
        sub_id1: U7::new(0x01),
        sub_id2: U7::new(0x01),
        data: vec![
            ((rate.code() << 5) | (timecode.hours & 0x1F)),
            timecode.minutes,
            timecode.seconds,
            timecode.frames,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_frame_pieces() {
        let tc = Timecode::new(2, 22, 34, 1);
        let events = quarter_frames(&tc, MtcRate::Fps30, U4::MIN);
        let bytes: Vec<u8> = events
            .iter()
            .map(|event| match event {
                MidiEvent::SystemCommon {
                    msg: SystemCommonMsg::TimecodeQuarterFrame { data },
                    ..
                } => data.get(),
                _ => panic!("expected quarter frame"),
            })
            .collect();
        assert_eq!(bytes, vec![0x01, 0x10, 0x22, 0x32, 0x46, 0x51, 0x62, 0x76]);
    }

    #[test]
    fn test_full_frame_wire_bytes() {
        let event = full_frame(&Timecode::new(1, 2, 3, 4), MtcRate::Fps25, U7::new(0x7F));
        let bytes = event.to_midi1_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![0xF0, 0x7F, 0x7F, 0x01, 0x01, 0x21, 0x02, 0x03, 0x04, 0xF7]
        );
    }

    #[test]
    fn test_generator_feeds_receiver() {
        let mut receiver = crate::receiver::MtcReceiver::new();
        let tc = Timecode::new(5, 6, 7, 8);
        let mut last = None;
        for event in quarter_frames(&tc, MtcRate::Fps24, U4::MIN) {
            last = receiver.feed(&event);
        }
        let update = last.expect("emission after eight pieces");
        assert_eq!(update.rate, MtcRate::Fps24);
        assert_eq!(update.timecode, tc.offset_frames(2, 24));
    }
}
