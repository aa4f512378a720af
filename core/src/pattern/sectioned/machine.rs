use crate::math::Vector3;
use crate::pattern::{AngleCoordinate, ComplexField};
use crate::prelude::{DecoderConfig, PatternError, PatternResult};
use crate::telemetry::LogManager;
use crate::text::fields::{parse_count_pair, parse_f64, parse_usize, parse_vector3, FieldReader};

use super::{FrequencyDescriptor, SectionedSample};
use num_complex::Complex64;

pub const BANNER: &str = "// CST Farfield Source File";

const VERSION: &str = "// Version:";
const DATA_TYPE: &str = "// Data Type";
const FREQUENCIES: &str = "// #Frequencies";
const POSITION: &str = "// Position";
const Z_AXIS: &str = "// zAxis";
const Y_AXIS: &str = "// yAxis";
const X_AXIS: &str = "// xAxis";
const POWER_TABLE: &str = "// Radiated/Accepted/Stimulated Power , Frequency";
const SAMPLE_COUNTS: &str = "// >> Total #phi samples, total #theta samples";
const SAMPLE_TABLE: &str = "// >> Phi, Theta, Re(E_Theta), Im(E_Theta), Re(E_Phi), Im(E_Phi):";

/// Sections holding one payload line followed by a blank separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Version,
    DataType,
    Frequencies,
    Position,
    ZAxis,
    YAxis,
    XAxis,
    SampleCounts,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::DataType => "data type",
            Self::Frequencies => "frequency count",
            Self::Position => "phase centre position",
            Self::ZAxis => "zAxis",
            Self::YAxis => "yAxis",
            Self::XAxis => "xAxis",
            Self::SampleCounts => "sample counts",
        }
    }
}

/// Quantities of one power/frequency group, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Accepted,
    Stimulated,
    Frequency,
}

impl Quantity {
    fn name(self) -> &'static str {
        match self {
            Self::Accepted => "accepted power",
            Self::Stimulated => "stimulated power",
            Self::Frequency => "frequency",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Expect {
    Banner,
    Marker,
    Payload(Section),
    Separator(Section),
    /// First line of a power/frequency group, or the blank closing the table.
    /// `opened` is set right after the table marker.
    GroupStart {
        opened: bool,
    },
    Group {
        next: Quantity,
        values: [f64; 3],
    },
    GroupSeparator,
    Samples {
        opened: bool,
    },
}

/// Outcome of one [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    Continue,
    BlockStart,
    Sample(SectionedSample),
    BlockEnd,
}

/// Parse context carried across sections.
pub(crate) struct Machine {
    expect: Expect,
    config: DecoderConfig,
    logger: LogManager,
    pub descriptors: Vec<FrequencyDescriptor>,
    descriptors_closed: bool,
    /// When false, auxiliary payloads are consumed without being parsed.
    auxiliary: bool,
    /// Index of the descriptor the current or next sample block belongs to.
    pub block_index: usize,
    pub sample_hint: usize,
    pub version: Option<String>,
    pub data_type: Option<String>,
    pub position: Option<Vector3>,
    pub x_axis: Option<Vector3>,
    pub y_axis: Option<Vector3>,
    pub z_axis: Option<Vector3>,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

impl Machine {
    pub fn new(config: &DecoderConfig, logger: LogManager) -> Self {
        Self {
            expect: Expect::Banner,
            config: config.clone(),
            logger,
            descriptors: Vec::new(),
            descriptors_closed: false,
            auxiliary: true,
            block_index: 0,
            sample_hint: 0,
            version: None,
            data_type: None,
            position: None,
            x_axis: None,
            y_axis: None,
            z_axis: None,
        }
    }

    /// Stops parsing version, data type, position, axes and sample counts.
    /// Their sections are still walked, separators included.
    pub fn skip_auxiliary(mut self) -> Self {
        self.auxiliary = false;
        self
    }

    pub fn logger(&self) -> &LogManager {
        &self.logger
    }

    /// Descriptor of the sample block currently being read.
    pub fn active_descriptor(&self) -> Option<&FrequencyDescriptor> {
        self.descriptors.get(self.block_index)
    }

    /// True once every declared descriptor has had its sample block.
    pub fn blocks_exhausted(&self) -> bool {
        self.descriptors_closed && self.block_index >= self.descriptors.len()
    }

    pub fn step(&mut self, line_no: usize, line: Option<&str>) -> PatternResult<Step> {
        let Some(line) = line else {
            return self.end_of_stream(line_no);
        };
        self.step_line(line_no, line).map_err(|e| e.at(line_no))
    }

    fn end_of_stream(&mut self, line_no: usize) -> PatternResult<Step> {
        let at_eof = line_no + 1;
        match self.expect {
            Expect::Banner => Err(PatternError::format(at_eof, "missing file banner")),
            Expect::Marker | Expect::Separator(_) | Expect::GroupStart { opened: false } => {
                Ok(Step::Continue)
            }
            Expect::GroupStart { opened: true } => Err(PatternError::format(
                at_eof,
                "unexpected end of file: missing power/frequency table",
            )),
            Expect::Payload(section) => Err(PatternError::format(
                at_eof,
                format!("unexpected end of file: missing {} line", section.name()),
            )),
            Expect::Group { next, .. } => Err(PatternError::format(
                at_eof,
                format!("unexpected end of file: missing {} line", next.name()),
            )),
            Expect::GroupSeparator => Err(PatternError::format(
                at_eof,
                "unexpected end of file: missing separator after frequency group",
            )),
            Expect::Samples { opened: true } => Err(PatternError::format(
                at_eof,
                "unexpected end of file: missing sample table",
            )),
            Expect::Samples { opened: false } => {
                self.expect = Expect::Marker;
                self.close_block();
                Ok(Step::BlockEnd)
            }
        }
    }

    fn step_line(&mut self, line_no: usize, line: &str) -> PatternResult<Step> {
        match self.expect {
            Expect::Banner => {
                if line != BANNER {
                    return Err(PatternError::missing(format!(
                        "expected banner {BANNER:?}, found {line:?}"
                    )));
                }
                self.expect = Expect::Marker;
            }
            Expect::Marker => return self.dispatch(line_no, line),
            Expect::Payload(section) => {
                self.payload(section, line)?;
                self.expect = Expect::Separator(section);
            }
            Expect::Separator(section) => {
                if !is_blank(line) {
                    return Err(PatternError::missing(format!(
                        "missing separator line after {} section",
                        section.name()
                    )));
                }
                self.expect = Expect::Marker;
            }
            Expect::GroupStart { .. } => {
                if is_blank(line) {
                    self.close_descriptors();
                } else if line.trim_start().starts_with("//") {
                    // A marker right after the last group also closes the table.
                    self.close_descriptors();
                    return self.dispatch(line_no, line);
                } else {
                    let radiated = parse_f64(line, "radiated power")?;
                    self.expect = Expect::Group {
                        next: Quantity::Accepted,
                        values: [radiated, 0.0, 0.0],
                    };
                }
            }
            Expect::Group { next, mut values } => {
                if is_blank(line) {
                    return Err(PatternError::missing(format!(
                        "missing {} line in frequency group",
                        next.name()
                    )));
                }
                let value = parse_f64(line, next.name())?;
                self.expect = match next {
                    Quantity::Accepted => {
                        values[1] = value;
                        Expect::Group {
                            next: Quantity::Stimulated,
                            values,
                        }
                    }
                    Quantity::Stimulated => {
                        values[2] = value;
                        Expect::Group {
                            next: Quantity::Frequency,
                            values,
                        }
                    }
                    Quantity::Frequency => {
                        let [radiated, accepted, stimulated] = values;
                        self.descriptors.push(FrequencyDescriptor {
                            frequency: value,
                            radiated,
                            accepted,
                            stimulated,
                        });
                        Expect::GroupSeparator
                    }
                };
            }
            Expect::GroupSeparator => {
                if !is_blank(line) {
                    return Err(PatternError::missing(
                        "missing separator after frequency group",
                    ));
                }
                self.expect = Expect::GroupStart { opened: false };
            }
            Expect::Samples { .. } => {
                if is_blank(line) {
                    self.expect = Expect::Marker;
                    self.close_block();
                    return Ok(Step::BlockEnd);
                }
                self.expect = Expect::Samples { opened: false };
                return Ok(Step::Sample(parse_sample(line)?));
            }
        }
        Ok(Step::Continue)
    }

    fn dispatch(&mut self, line_no: usize, line: &str) -> PatternResult<Step> {
        let marker = line.trim();
        if marker.is_empty() {
            return Ok(Step::Continue);
        }
        let section = match marker {
            VERSION => Section::Version,
            DATA_TYPE => Section::DataType,
            FREQUENCIES => Section::Frequencies,
            POSITION => Section::Position,
            Z_AXIS => Section::ZAxis,
            Y_AXIS => Section::YAxis,
            X_AXIS => Section::XAxis,
            SAMPLE_COUNTS => Section::SampleCounts,
            POWER_TABLE => {
                if self.descriptors_closed {
                    return Err(PatternError::missing("duplicate power/frequency table"));
                }
                self.logger.section(line_no, "power/frequency table");
                self.expect = Expect::GroupStart { opened: true };
                return Ok(Step::Continue);
            }
            SAMPLE_TABLE => {
                if self.active_descriptor().is_none() {
                    return Err(PatternError::missing(format!(
                        "sample block {} has no matching frequency descriptor",
                        self.block_index + 1
                    )));
                }
                self.logger.section(line_no, "sample table");
                self.expect = Expect::Samples { opened: true };
                return Ok(Step::BlockStart);
            }
            other => {
                self.logger.ignored(line_no, other);
                return Ok(Step::Continue);
            }
        };
        self.logger.section(line_no, section.name());
        self.expect = Expect::Payload(section);
        Ok(Step::Continue)
    }

    fn payload(&mut self, section: Section, line: &str) -> PatternResult<()> {
        if !self.auxiliary && section != Section::Frequencies {
            return Ok(());
        }
        match section {
            Section::Version => self.version = Some(line.to_string()),
            Section::DataType => self.data_type = Some(line.to_string()),
            Section::Frequencies => {
                let declared = parse_usize(line, "frequency count")?;
                let reserve = self.hint("frequencies", declared);
                self.descriptors.reserve(reserve);
            }
            Section::Position => self.position = Some(parse_vector3(line, section.name())?),
            Section::ZAxis => self.z_axis = Some(parse_vector3(line, section.name())?),
            Section::YAxis => self.y_axis = Some(parse_vector3(line, section.name())?),
            Section::XAxis => self.x_axis = Some(parse_vector3(line, section.name())?),
            Section::SampleCounts => {
                let (phi, theta) = parse_count_pair(line, section.name())?;
                self.sample_hint = self.hint("samples", phi.saturating_mul(theta));
            }
        }
        Ok(())
    }

    fn hint(&self, what: &str, declared: usize) -> usize {
        let used = self.config.clamp_hint(declared);
        if used < declared {
            self.logger.clamped(what, declared, used);
        }
        used
    }

    fn close_descriptors(&mut self) {
        self.descriptors.shrink_to_fit();
        self.descriptors_closed = true;
        self.expect = Expect::Marker;
        self.logger.record(&format!(
            "{} frequency descriptors declared",
            self.descriptors.len()
        ));
    }

    fn close_block(&mut self) {
        self.block_index += 1;
    }
}

/// Parses `phi theta Re(Eθ) Im(Eθ) Re(Eφ) Im(Eφ)`.
fn parse_sample(line: &str) -> PatternResult<SectionedSample> {
    let mut fields = FieldReader::new(line);
    let phi = fields.next_f64("phi")?;
    let theta = fields.next_f64("theta")?;
    let theta_re = fields.next_f64("Re(E_theta)")?;
    let theta_im = fields.next_f64("Im(E_theta)")?;
    let phi_re = fields.next_f64("Re(E_phi)")?;
    let phi_im = fields.next_f64("Im(E_phi)")?;
    Ok(SectionedSample {
        angle: AngleCoordinate::new(theta, phi),
        field: ComplexField::new(
            Complex64::new(theta_re, theta_im),
            Complex64::new(phi_re, phi_im),
        ),
    })
}
