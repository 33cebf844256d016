//! Point-in-time capability snapshots of a single board.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use super::info::{
    AudioBitsPerSample, AudioChannels, AudioSampleRate, AudioSource, Count, FamilyId, Feature,
    SerialNumber,
};
use super::{AUDIO_CONTROL_AES_PRESENT, DeviceDriver, DeviceHandle};

/// Logical device overlaid on a physical board via external configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualDeviceInfo {
    pub id: String,
    pub name: String,
}

/// Video-side capability payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)] // One flag per capability register
pub struct VideoCapabilities {
    pub num_video_inputs: u32,
    pub num_video_outputs: u32,
    pub num_analog_video_inputs: u32,
    pub num_analog_video_outputs: u32,
    pub num_hdmi_video_inputs: u32,
    pub num_hdmi_video_outputs: u32,
    pub num_input_converters: u32,
    pub num_output_converters: u32,
    pub num_up_converters: u32,
    pub num_down_converters: u32,
    pub down_converter_delay: u32,
    pub num_dma_engines: u32,
    pub ping_led: u32,
    pub num_serial_ports: u32,
    pub dvcpro_hd: bool,
    pub qrez: bool,
    pub hdv: bool,
    pub quarter_expand: bool,
    pub color_correction: bool,
    pub programmable_csc: bool,
    pub rgb_alpha_output: bool,
    pub breakout_box: bool,
    pub video_processing: bool,
    pub dual_link: bool,
    pub video_2k: bool,
    pub video_4k: bool,
    pub video_8k: bool,
    pub level_conversion_3g: bool,
    pub iso_convert: bool,
    pub rate_convert: bool,
    pub prores: bool,
    pub sdi_3g: bool,
    pub sdi_12g: bool,
    pub ip: bool,
    pub bidirectional_sdi: bool,
    pub ltc_in: bool,
    pub ltc_out: bool,
    pub ltc_in_on_ref_port: bool,
    pub stereo_out: bool,
    pub stereo_in: bool,
    pub multi_format: bool,
    pub proc_amp: bool,
}

impl VideoCapabilities {
    /// Query every video capability, one driver call per attribute.
    pub fn capture(handle: &impl DeviceHandle) -> Self {
        let num = |count| handle.num_supported(count);
        let can = |feature| handle.is_supported(feature);
        Self {
            num_video_inputs: num(Count::NumVideoInputs),
            num_video_outputs: num(Count::NumVideoOutputs),
            num_analog_video_inputs: num(Count::NumAnalogVideoInputs),
            num_analog_video_outputs: num(Count::NumAnalogVideoOutputs),
            num_hdmi_video_inputs: num(Count::NumHdmiVideoInputs),
            num_hdmi_video_outputs: num(Count::NumHdmiVideoOutputs),
            num_input_converters: num(Count::NumInputConverters),
            num_output_converters: num(Count::NumOutputConverters),
            num_up_converters: num(Count::NumUpConverters),
            num_down_converters: num(Count::NumDownConverters),
            down_converter_delay: num(Count::DownConverterDelay),
            num_dma_engines: num(Count::NumDmaEngines),
            ping_led: num(Count::PingLed),
            num_serial_ports: num(Count::NumSerialPorts),
            dvcpro_hd: can(Feature::CanDoDvcProHd),
            qrez: can(Feature::CanDoQrez),
            hdv: can(Feature::CanDoHdv),
            quarter_expand: can(Feature::CanDoQuarterExpand),
            color_correction: can(Feature::CanDoColorCorrection),
            programmable_csc: can(Feature::CanDoProgrammableCsc),
            rgb_alpha_output: can(Feature::CanDoRgbPlusAlphaOut),
            breakout_box: can(Feature::CanDoBreakoutBox),
            video_processing: can(Feature::CanDoVideoProcessing),
            dual_link: can(Feature::CanDoDualLink),
            video_2k: can(Feature::CanDo2kVideo),
            video_4k: can(Feature::CanDo4kVideo),
            video_8k: can(Feature::CanDo8kVideo),
            level_conversion_3g: can(Feature::CanDo3gLevelConversion),
            iso_convert: can(Feature::CanDoIsoConvert),
            rate_convert: can(Feature::CanDoRateConvert),
            prores: can(Feature::CanDoProRes),
            sdi_3g: can(Feature::Has3gSdiOutput),
            sdi_12g: can(Feature::CanDo12gSdi),
            ip: can(Feature::CanDoIp),
            bidirectional_sdi: can(Feature::HasBiDirectionalSdi),
            ltc_in: num(Count::NumLtcInputs) > 0,
            ltc_out: num(Count::NumLtcOutputs) > 0,
            ltc_in_on_ref_port: can(Feature::CanDoLtcInOnRefPort),
            stereo_out: can(Feature::CanDoStereoOut),
            stereo_in: can(Feature::CanDoStereoIn),
            multi_format: can(Feature::CanDoMultiFormat),
            proc_amp: false,
        }
    }
}

/// Audio-side capability payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioCapabilities {
    pub sample_rates: Vec<AudioSampleRate>,
    pub channels_per_frame: Vec<AudioChannels>,
    pub bits_per_sample: Vec<AudioBitsPerSample>,
    pub input_sources: Vec<AudioSource>,
    pub output_sources: Vec<AudioSource>,
    pub num_audio_streams: u32,
    pub analog_input_channels: u32,
    pub aes_input_channels: u32,
    pub embedded_input_channels: u32,
    pub hdmi_input_channels: u32,
    pub analog_output_channels: u32,
    pub aes_output_channels: u32,
    pub embedded_output_channels: u32,
    pub hdmi_output_channels: u32,
}

impl AudioCapabilities {
    /// Query the audio subgroup.
    ///
    /// The lists are only filled when the board reports at least one audio
    /// system; the per-interface channel counts are always queried.
    pub fn capture(handle: &impl DeviceHandle) -> Self {
        let mut audio = Self::default();

        let audio_systems = handle.num_supported(Count::NumAudioSystems);
        if audio_systems > 0 {
            let control = handle.audio_control();

            audio.sample_rates.push(AudioSampleRate::Hz48k);
            if handle.is_supported(Feature::CanDoAudio96k) {
                audio.sample_rates.push(AudioSampleRate::Hz96k);
            }

            audio.bits_per_sample.push(AudioBitsPerSample::Bits32);

            audio.input_sources.push(AudioSource::Sdi);
            if control & AUDIO_CONTROL_AES_PRESENT != 0 {
                audio.input_sources.push(AudioSource::Aes);
            }
            if handle.is_supported(Feature::CanDoAnalogAudio) {
                audio.input_sources.push(AudioSource::Analog);
            }

            audio.output_sources.push(AudioSource::All);

            for (feature, channels) in [
                (Feature::CanDoAudio2Channels, AudioChannels::Two),
                (Feature::CanDoAudio6Channels, AudioChannels::Six),
                (Feature::CanDoAudio8Channels, AudioChannels::Eight),
            ] {
                if handle.is_supported(feature) {
                    audio.channels_per_frame.push(channels);
                }
            }

            audio.num_audio_streams = audio_systems;
        } else {
            trace!("No audio systems reported");
        }

        audio.analog_input_channels = handle.num_supported(Count::NumAnalogAudioInputChannels);
        audio.aes_input_channels = handle.num_supported(Count::NumAesAudioInputChannels);
        audio.embedded_input_channels = handle.num_supported(Count::NumEmbeddedAudioInputChannels);
        audio.hdmi_input_channels = handle.num_supported(Count::NumHdmiAudioInputChannels);
        audio.analog_output_channels = handle.num_supported(Count::NumAnalogAudioOutputChannels);
        audio.aes_output_channels = handle.num_supported(Count::NumAesAudioOutputChannels);
        audio.embedded_output_channels =
            handle.num_supported(Count::NumEmbeddedAudioOutputChannels);
        audio.hdmi_output_channels = handle.num_supported(Count::NumHdmiAudioOutputChannels);

        audio
    }
}

/// Identity and capability record for one discovered board.
///
/// Equality compares identity only: `family_id`, `index`, `serial_number`
/// and `pci_slot`. Two records with different capability payloads still
/// describe the same device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    /// Slot index for local boards; offset range for virtual entries.
    pub index: u32,
    pub family_id: Option<FamilyId>,
    pub serial_number: Option<SerialNumber>,
    pub pci_slot: u32,
    /// "<family name> - <index>"; searched by name lookups.
    pub display_name: String,
    pub video: VideoCapabilities,
    pub audio: AudioCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_device: Option<VirtualDeviceInfo>,
}

impl DeviceSnapshot {
    /// Bare identity record with empty capability payload.
    #[must_use]
    pub fn new(
        index: u32,
        family_id: Option<FamilyId>,
        serial_number: Option<SerialNumber>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            index,
            family_id,
            serial_number,
            pci_slot: 0,
            display_name: display_name.into(),
            video: VideoCapabilities::default(),
            audio: AudioCapabilities::default(),
            virtual_device: None,
        }
    }

    /// Build a snapshot from an open handle.
    ///
    /// Returns `None` if the board reports no family id; such boards are
    /// never listed.
    pub fn capture<D: DeviceDriver + ?Sized>(
        driver: &D,
        handle: &D::Handle,
        index: u32,
    ) -> Option<Self> {
        let Some(family) = handle.family_id() else {
            debug!(index, "Board reports no family id, skipping");
            return None;
        };

        let variant = handle.is_supported(Feature::HasMicrophoneInput);
        let family_name = driver
            .family_name(family, variant)
            .unwrap_or_else(|| family.to_string());

        let snapshot = Self {
            index,
            family_id: Some(family),
            serial_number: handle.serial_number(),
            pci_slot: handle.pci_slot(),
            display_name: format!("{family_name} - {index}"),
            video: VideoCapabilities::capture(handle),
            audio: AudioCapabilities::capture(handle),
            virtual_device: None,
        };
        trace!(index, name = %snapshot.display_name, "Captured snapshot");
        Some(snapshot)
    }

    /// Copy of this record presented as a virtual device at `index`.
    #[must_use]
    pub fn as_virtual(&self, index: u32, device: VirtualDeviceInfo) -> Self {
        Self {
            index,
            virtual_device: Some(device),
            ..self.clone()
        }
    }

    pub const fn is_virtual(&self) -> bool {
        self.virtual_device.is_some()
    }

    /// ASCII serial, when the serial register holds one.
    #[must_use]
    pub fn serial_string(&self) -> Option<String> {
        self.serial_number.and_then(SerialNumber::to_ascii)
    }
}

impl PartialEq for DeviceSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.family_id == other.family_id
            && self.index == other.index
            && self.serial_number == other.serial_number
            && self.pci_slot == other.pci_slot
    }
}

impl Eq for DeviceSnapshot {}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Y" } else { "N" }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for DeviceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.video;
        let a = &self.audio;
        let family = self
            .family_id
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        let serial = self
            .serial_number
            .map_or_else(|| "none".to_string(), |sn| sn.to_string());
        let rates: Vec<u32> = a.sample_rates.iter().map(|r| r.hz()).collect();
        let channels: Vec<u32> = a.channels_per_frame.iter().map(|c| c.count()).collect();

        writeln!(f, "Device Info for '{}'", self.display_name)?;
        writeln!(f, "{:>32}: {}", "Device Index Number", self.index)?;
        writeln!(f, "{:>32}: {family}", "Device ID")?;
        writeln!(f, "{:>32}: {serial}", "Serial Number")?;
        writeln!(f, "{:>32}: 0x{:x}", "PCI Slot", self.pci_slot)?;
        if let Some(vd) = &self.virtual_device {
            writeln!(f, "{:>32}: {} ({})", "Virtual Device", vd.name, vd.id)?;
        }
        writeln!(f, "{:>32}: {}", "Video Inputs", v.num_video_inputs)?;
        writeln!(f, "{:>32}: {}", "Video Outputs", v.num_video_outputs)?;
        writeln!(f, "{:>32}: {}", "HDMI Video Inputs", v.num_hdmi_video_inputs)?;
        writeln!(f, "{:>32}: {}", "HDMI Video Outputs", v.num_hdmi_video_outputs)?;
        writeln!(f, "{:>32}: {}", "DMA Engines", v.num_dma_engines)?;
        writeln!(f, "{:>32}: {}", "Serial Ports", v.num_serial_ports)?;
        writeln!(f, "{:>32}: {}", "2K", yes_no(v.video_2k))?;
        writeln!(f, "{:>32}: {}", "4K", yes_no(v.video_4k))?;
        writeln!(f, "{:>32}: {}", "8K", yes_no(v.video_8k))?;
        writeln!(f, "{:>32}: {}", "SDI 3G", yes_no(v.sdi_3g))?;
        writeln!(f, "{:>32}: {}", "SDI 12G", yes_no(v.sdi_12g))?;
        writeln!(f, "{:>32}: {}", "IP", yes_no(v.ip))?;
        writeln!(f, "{:>32}: {}", "ProRes", yes_no(v.prores))?;
        writeln!(f, "{:>32}: {}", "LTC In", yes_no(v.ltc_in))?;
        writeln!(f, "{:>32}: {}", "LTC Out", yes_no(v.ltc_out))?;
        writeln!(f, "{:>32}: {}", "Audio Sample Rates", join(&rates))?;
        writeln!(f, "{:>32}: {}", "Audio Channels Per Frame", join(&channels))?;
        writeln!(f, "{:>32}: {}", "Audio In Sources", join(&a.input_sources))?;
        writeln!(f, "{:>32}: {}", "Audio Out Sources", join(&a.output_sources))?;
        writeln!(f, "{:>32}: {}", "Audio Streams", a.num_audio_streams)?;
        writeln!(f, "{:>32}: {}", "Embedded Audio Input Channels", a.embedded_input_channels)?;
        write!(f, "{:>32}: {}", "Embedded Audio Output Channels", a.embedded_output_channels)
    }
}
