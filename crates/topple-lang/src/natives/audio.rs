use crate::error::RuntimeError;
use crate::Value;
use super::{Host, NativeProvider, NativeSig, arg, as_number, as_text};

/// Volume levels run 0 (silent) to 10 (full).
pub const MAX_VOLUME: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Start a looping track, replacing the current one.
    PlayMusic { track: String },
    StopMusic,
    /// Fire-and-forget clip.
    Sound { clip: String },
    Volume { channel: String, level: f64 },
}

const NATIVES: &[NativeSig] = &[
    NativeSig::new("music",      &["track"]),
    NativeSig::new("stop_music", &[]),
    NativeSig::new("sound",      &["clip"]),
    NativeSig::new("volume",     &["channel", "level"]),
];

pub struct AudioNatives;

impl NativeProvider for AudioNatives {
    fn name(&self) -> &'static str { "audio" }

    fn natives(&self) -> &'static [NativeSig] { NATIVES }

    fn call(
        &self,
        name: &str,
        args: &[Value],
        host: &mut Host,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let cmd = match name {
            "music"      => AudioCommand::PlayMusic { track: as_text(name, arg(args, 0), line)? },
            "stop_music" => AudioCommand::StopMusic,
            "sound"      => AudioCommand::Sound { clip: as_text(name, arg(args, 0), line)? },
            "volume" => AudioCommand::Volume {
                channel: as_text(name, arg(args, 0), line)?,
                level: as_number(name, arg(args, 1), line)?.clamp(0.0, MAX_VOLUME),
            },
            _ => return Ok(None),
        };
        host.audio.push(cmd);
        Ok(Some(Value::Null))
    }
}
