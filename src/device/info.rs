//! Identity and capability key types for capture boards.

use std::fmt;
use std::num::{NonZeroU32, NonZeroU64};

use serde::{Deserialize, Serialize};

/// Opaque device-family (model) identifier.
///
/// The driver historically reports `0` or `0xFFFFFFFF` for "not found";
/// both map to `None` in [`FamilyId::from_raw`] so a `FamilyId` value is
/// always a real family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FamilyId(NonZeroU32);

impl FamilyId {
    /// Raw value the driver uses when no family could be read.
    pub const NOT_FOUND_RAW: u32 = 0xFFFF_FFFF;

    /// Convert a raw driver value, rejecting both "not found" sentinels.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw == Self::NOT_FOUND_RAW {
            return None;
        }
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw register value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.raw())
    }
}

/// 64-bit board serial number, as programmed in the board's EEPROM.
///
/// The value packs up to eight ASCII characters big-endian. Zero means
/// "not programmed" and is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SerialNumber(NonZeroU64);

impl SerialNumber {
    /// Wrap a raw 64-bit serial. Zero yields `None`.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw 64-bit value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Pack an ASCII serial string (1-8 chars) into its 64-bit form.
    #[must_use]
    pub fn from_ascii(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.is_empty() || bytes.len() > 8 || !bytes.iter().all(|b| is_serial_byte(*b)) {
            return None;
        }
        let mut packed = [0u8; 8];
        packed[..bytes.len()].copy_from_slice(bytes);
        Self::new(u64::from_be_bytes(packed))
    }

    /// ASCII form of the serial, if every byte up to the first NUL is a
    /// legal serial character.
    #[must_use]
    pub fn to_ascii(self) -> Option<String> {
        let mut text = String::with_capacity(8);
        for byte in self.get().to_be_bytes() {
            if byte == 0 {
                break;
            }
            if !is_serial_byte(byte) {
                return None;
            }
            text.push(char::from(byte));
        }
        if text.is_empty() { None } else { Some(text) }
    }

    /// Sixteen lower-case hex digits.
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.get().to_be_bytes())
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

const fn is_serial_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b' ' || byte == b'-'
}

/// Boolean capability keys, one driver query each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    HasMicrophoneInput,
    CanDoDvcProHd,
    CanDoQrez,
    CanDoHdv,
    CanDoQuarterExpand,
    CanDoColorCorrection,
    CanDoProgrammableCsc,
    CanDoRgbPlusAlphaOut,
    CanDoBreakoutBox,
    CanDoVideoProcessing,
    CanDoDualLink,
    #[serde(rename = "can_do_2k_video")]
    CanDo2kVideo,
    #[serde(rename = "can_do_4k_video")]
    CanDo4kVideo,
    #[serde(rename = "can_do_8k_video")]
    CanDo8kVideo,
    #[serde(rename = "can_do_3g_level_conversion")]
    CanDo3gLevelConversion,
    CanDoIsoConvert,
    CanDoRateConvert,
    CanDoProRes,
    /// First 3G-SDI output widget is present.
    #[serde(rename = "has_3g_sdi_output")]
    Has3gSdiOutput,
    #[serde(rename = "can_do_12g_sdi")]
    CanDo12gSdi,
    CanDoIp,
    HasBiDirectionalSdi,
    CanDoLtcInOnRefPort,
    CanDoStereoOut,
    CanDoStereoIn,
    CanDoMultiFormat,
    #[serde(rename = "can_do_audio_96k")]
    CanDoAudio96k,
    CanDoAnalogAudio,
    #[serde(rename = "can_do_audio_2_channels")]
    CanDoAudio2Channels,
    #[serde(rename = "can_do_audio_6_channels")]
    CanDoAudio6Channels,
    #[serde(rename = "can_do_audio_8_channels")]
    CanDoAudio8Channels,
}

/// Numeric capability keys, one driver query each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Count {
    NumVideoInputs,
    NumVideoOutputs,
    NumAnalogVideoInputs,
    NumAnalogVideoOutputs,
    NumHdmiVideoInputs,
    NumHdmiVideoOutputs,
    NumInputConverters,
    NumOutputConverters,
    NumUpConverters,
    NumDownConverters,
    DownConverterDelay,
    NumDmaEngines,
    PingLed,
    NumLtcInputs,
    NumLtcOutputs,
    NumSerialPorts,
    NumAudioSystems,
    NumAnalogAudioInputChannels,
    NumAesAudioInputChannels,
    NumEmbeddedAudioInputChannels,
    NumHdmiAudioInputChannels,
    NumAnalogAudioOutputChannels,
    NumAesAudioOutputChannels,
    NumEmbeddedAudioOutputChannels,
    NumHdmiAudioOutputChannels,
}

/// Supported audio sample rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioSampleRate {
    #[serde(rename = "48000")]
    Hz48k,
    #[serde(rename = "96000")]
    Hz96k,
}

/// Supported audio channel counts per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioChannels {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "8")]
    Eight,
}

/// Supported audio sample widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioBitsPerSample {
    #[serde(rename = "32")]
    Bits32,
}

/// Audio source/destination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    Sdi,
    Aes,
    Adat,
    Analog,
    None,
    All,
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sdi => "SDI",
            Self::Aes => "AES",
            Self::Adat => "ADAT",
            Self::Analog => "Analog",
            Self::None => "None",
            Self::All => "All",
        })
    }
}

impl AudioSampleRate {
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz48k => 48_000,
            Self::Hz96k => 96_000,
        }
    }
}

impl AudioChannels {
    #[must_use]
    pub const fn count(self) -> u32 {
        match self {
            Self::Two => 2,
            Self::Six => 6,
            Self::Eight => 8,
        }
    }
}
