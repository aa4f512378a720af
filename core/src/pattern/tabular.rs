use std::io::BufRead;
use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;

use crate::math::units::{self, amplitude_db, power_db};
use crate::math::{Interval, RangeTracker};
use crate::pattern::{drive, drive_async, AngleCoordinate, ComplexField, LineConsumer};
use crate::prelude::{DecoderConfig, PatternError, PatternResult};
use crate::telemetry::{DecodeStats, LogManager, MetricsRecorder};
use crate::text::fields::FieldReader;

const ANGLE_FIELD: &str = "Theta";
const MAGNITUDE_FIELD: &str = "Abs(Dir.)";
const DEGREE_UNIT: &str = "deg.";
const DECIBEL_UNIT: &str = "dBi";

/// Bracketed unit that follows `name` in the header, e.g. `deg.` in
/// `Theta [deg.]`. The name is matched case-insensitively.
pub fn header_unit<'h>(header: &'h str, name: &str) -> PatternResult<&'h str> {
    let haystack = header.to_ascii_lowercase();
    let start = haystack
        .find(&name.to_ascii_lowercase())
        .ok_or_else(|| PatternError::format(1, format!("header has no {name} field")))?;
    let rest = &header[start + name.len()..];
    let open = rest
        .find('[')
        .ok_or_else(|| PatternError::format(1, format!("header field {name} has no unit")))?;
    let close = rest[open + 1..]
        .find(']')
        .ok_or_else(|| PatternError::format(1, format!("header field {name} has no unit")))?;
    Ok(rest[open + 1..open + 1 + close].trim())
}

/// Units declared by the header line.
///
/// Anything other than `deg.` is read as radians and anything other than
/// `dBi` as linear; unrecognised tokens are not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderUnits {
    pub angle_in_deg: bool,
    pub magnitude_in_db: bool,
}

impl HeaderUnits {
    pub fn parse(header: &str) -> PatternResult<Self> {
        Ok(Self {
            angle_in_deg: header_unit(header, ANGLE_FIELD)?.eq_ignore_ascii_case(DEGREE_UNIT),
            magnitude_in_db: header_unit(header, MAGNITUDE_FIELD)?
                .eq_ignore_ascii_case(DECIBEL_UNIT),
        })
    }
}

/// One row of the tabular export, normalised to degrees and linear values.
///
/// Columns: theta, phi, directivity, |E_theta|, arg E_theta, |E_phi|, arg E_phi,
/// axis ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TabularSample {
    pub angle: AngleCoordinate,
    /// Linear directivity.
    pub directivity: f64,
    pub field: ComplexField,
    /// Linear axis ratio.
    pub axis_ratio: f64,
}

impl TabularSample {
    fn parse(line: &str, units: HeaderUnits) -> PatternResult<Self> {
        let mut fields = FieldReader::new(line);
        let mut next = |what: &'static str| {
            fields.next_f64(what).map_err(|_| PatternError::Data {
                line: None,
                text: line.to_string(),
                expected: what,
            })
        };

        let theta = units::degrees(next("theta")?, units.angle_in_deg);
        let phi = units::degrees(next("phi")?, units.angle_in_deg);
        let directivity = units::linear_from_power(next("directivity")?, units.magnitude_in_db);
        let theta_abs = units::linear_from_power(next("|E_theta|")?, units.magnitude_in_db);
        let theta_arg = units::degrees(next("E_theta phase")?, units.angle_in_deg);
        let phi_abs = units::linear_from_power(next("|E_phi|")?, units.magnitude_in_db);
        let phi_arg = units::degrees(next("E_phi phase")?, units.angle_in_deg);
        let axis_ratio = units::linear_from_amplitude(next("axis ratio")?, units.magnitude_in_db);

        Ok(Self {
            angle: AngleCoordinate::new(theta, phi),
            directivity,
            field: ComplexField::from_polar_deg(theta_abs, theta_arg, phi_abs, phi_arg),
            axis_ratio,
        })
    }

    pub fn directivity_db(&self) -> f64 {
        power_db(self.directivity)
    }

    /// `20·log10(axis ratio)`.
    pub fn axis_ratio_db(&self) -> f64 {
        amplitude_db(self.axis_ratio)
    }
}

/// Decoded tabular export. Only produced by a successful full decode.
#[derive(Debug, Clone, Serialize)]
pub struct TabularDataset {
    pub units: HeaderUnits,
    pub samples: Vec<TabularSample>,
    /// Observed theta range, `None` when the file has no rows.
    pub theta_range: Option<Interval>,
    pub phi_range: Option<Interval>,
    pub stats: DecodeStats,
}

impl TabularDataset {
    pub fn read<R: BufRead>(reader: R) -> PatternResult<Self> {
        TabularDecoder::default().read(reader)
    }

    pub async fn load_reader<R: AsyncBufRead + Unpin>(
        reader: R,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        TabularDecoder::default().load_reader(reader, cancel).await
    }

    pub async fn load_stream<S: AsyncRead + Unpin>(
        stream: S,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        TabularDecoder::default().load_stream(stream, cancel).await
    }

    pub async fn load_path(
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<Self> {
        TabularDecoder::default().load_path(path, cancel).await
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples of the cut at exactly `phi` degrees, in file order.
    pub fn samples_at_phi(&self, phi: f64) -> impl Iterator<Item = &TabularSample> {
        self.samples.iter().filter(move |s| s.angle.phi == phi)
    }
}

/// Tabular decoder entry points carrying a [`DecoderConfig`].
#[derive(Debug, Clone, Default)]
pub struct TabularDecoder {
    config: DecoderConfig,
}

impl TabularDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn read<R: BufRead>(&self, reader: R) -> PatternResult<TabularDataset> {
        drive(reader, TabularState::new(&self.config))
    }

    pub async fn load_reader<R: AsyncBufRead + Unpin>(
        &self,
        reader: R,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<TabularDataset> {
        drive_async(reader, cancel, TabularState::new(&self.config)).await
    }

    pub async fn load_stream<S: AsyncRead + Unpin>(
        &self,
        stream: S,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<TabularDataset> {
        self.load_reader(BufReader::new(stream), cancel).await
    }

    pub async fn load_path(
        &self,
        path: impl AsRef<Path>,
        cancel: Option<&CancellationToken>,
    ) -> PatternResult<TabularDataset> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        self.load_stream(file, cancel).await
    }
}

enum Stage {
    Header,
    UnitsLine(HeaderUnits),
    Rows(HeaderUnits),
}

struct TabularState {
    stage: Stage,
    samples: Vec<TabularSample>,
    theta: RangeTracker,
    phi: RangeTracker,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl TabularState {
    fn new(config: &DecoderConfig) -> Self {
        Self {
            stage: Stage::Header,
            samples: Vec::with_capacity(config.tabular_capacity_hint),
            theta: RangeTracker::new(),
            phi: RangeTracker::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("tabular").with_progress(config.log_progress_every),
        }
    }
}

impl LineConsumer for TabularState {
    type Output = TabularDataset;

    fn push_line(&mut self, line_no: usize, line: &str) -> PatternResult<()> {
        self.metrics.record_line(line_no);
        self.logger.progress(line_no);
        match self.stage {
            Stage::Header => {
                let units = HeaderUnits::parse(line)?;
                self.logger.section(line_no, "header");
                self.stage = Stage::UnitsLine(units);
            }
            Stage::UnitsLine(units) => self.stage = Stage::Rows(units),
            Stage::Rows(units) => {
                if line.trim().is_empty() {
                    return Ok(());
                }
                let sample = TabularSample::parse(line, units).map_err(|e| e.at(line_no))?;
                self.theta.add(sample.angle.theta);
                self.phi.add(sample.angle.phi);
                self.samples.push(sample);
                self.metrics.record_sample();
            }
        }
        Ok(())
    }

    fn finish(self, lines_read: usize) -> PatternResult<TabularDataset> {
        let units = match self.stage {
            Stage::Header => return Err(PatternError::missing("cannot read header line")),
            Stage::UnitsLine(units) | Stage::Rows(units) => units,
        };
        let mut samples = self.samples;
        samples.shrink_to_fit();
        self.logger.record(&format!(
            "decoded {} samples from {} lines",
            samples.len(),
            lines_read
        ));
        Ok(TabularDataset {
            units,
            samples,
            theta_range: self.theta.interval(),
            phi_range: self.phi.interval(),
            stats: self.metrics.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ErrorKind;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const DEG_DB_HEADER: &str =
        "Theta [deg.]  Phi   [deg.]  Abs(Dir.)[dBi   ]   Abs(Theta)[dBi   ]  Phase(Theta)[deg.]  Abs(Phi  )[dBi   ]  Phase(Phi  )[deg.]  Ax.Ratio[dB    ]";
    const RULE: &str = "------------------------------------------------------------------------";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn text(header: &str, rows: &[&str]) -> String {
        let mut out = format!("{header}\n{RULE}\n");
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    #[test]
    fn header_unit_is_found_case_insensitively() {
        assert_eq!(header_unit("theta [deg.] phi", "Theta").unwrap(), "deg.");
        assert_eq!(header_unit(DEG_DB_HEADER, "Abs(Dir.)").unwrap(), "dBi");
    }

    #[test]
    fn header_without_field_names_it() {
        let err = HeaderUnits::parse("Phi [deg.] Abs(Dir.)[dBi]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("Theta"));

        let err = HeaderUnits::parse("Abs(Dir.)[dBi] Theta deg.").unwrap_err();
        assert!(err.to_string().contains("Theta"));
    }

    #[test]
    fn unknown_unit_tokens_fall_back_to_radians_and_linear() {
        let units = HeaderUnits::parse("Theta[grad] Abs(Dir.)[dB]").unwrap();
        assert!(!units.angle_in_deg);
        assert!(!units.magnitude_in_db);
    }

    #[test]
    fn decodes_decibel_row_in_degrees() {
        let input = text(DEG_DB_HEADER, &["0 90 10 5 0 5 0 0.5"]);
        let dataset = TabularDataset::read(Cursor::new(input)).unwrap();
        assert_eq!(dataset.len(), 1);

        let sample = dataset.samples[0];
        assert_eq!(sample.angle, AngleCoordinate::new(0.0, 90.0));
        assert!(close(sample.directivity, 10.0));
        assert!(close(sample.directivity_db(), 10.0));
        assert!(close(sample.field.e_theta_abs(), 10f64.powf(0.5)));
        assert!(close(sample.field.e_theta_abs_db(), 5.0));
        assert!(close(sample.field.e_theta_phase_deg(), 0.0));
        assert!(close(sample.field.e_phi_abs_db(), 5.0));
        assert!(close(sample.axis_ratio, 10f64.powf(0.5 / 20.0)));
        assert!(close(sample.axis_ratio_db(), 0.5));
    }

    #[test]
    fn linear_radian_rows_are_converted_to_degrees() {
        let header = "Theta [rad.] Phi [rad.] Abs(Dir.)[ ] Abs(Theta)[ ] Phase(Theta)[rad.] Abs(Phi)[ ] Phase(Phi)[rad.] Ax.Ratio[ ]";
        let row = format!(
            "{} {} 2 3 {} 4 0 1.5",
            std::f64::consts::FRAC_PI_2,
            std::f64::consts::PI,
            std::f64::consts::FRAC_PI_2
        );
        let dataset = TabularDataset::read(Cursor::new(text(header, &[&row]))).unwrap();
        let sample = dataset.samples[0];
        assert!(close(sample.angle.theta, 90.0));
        assert!(close(sample.angle.phi, 180.0));
        assert_eq!(sample.directivity, 2.0);
        assert!(close(sample.field.e_theta.re, 0.0));
        assert!(close(sample.field.e_theta.im, 3.0));
        assert!(close(sample.field.e_phi_abs(), 4.0));
        assert_eq!(sample.axis_ratio, 1.5);
    }

    #[test]
    fn ranges_track_extremes_and_blank_lines_are_skipped() {
        let rows = [
            "0 0 1 1 0 1 0 0",
            "",
            "90 45 1 1 0 1 0 0",
            "   ",
            "45 -30 1 1 0 1 0 0",
        ];
        let dataset = TabularDataset::read(Cursor::new(text(DEG_DB_HEADER, &rows))).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.theta_range, Some(Interval { min: 0.0, max: 90.0 }));
        assert_eq!(dataset.phi_range, Some(Interval { min: -30.0, max: 45.0 }));
        assert_eq!(dataset.samples_at_phi(45.0).count(), 1);
        assert_eq!(dataset.stats.samples, 3);
        assert_eq!(dataset.stats.lines, 7);
    }

    #[test]
    fn whitespace_only_rows_are_skipped_like_empty_ones() {
        let rows = ["\t", "0 0 1 1 0 1 0 0", " \t  ", "10 0 1 1 0 1 0 0"];
        let dataset = TabularDataset::read(Cursor::new(text(DEG_DB_HEADER, &rows))).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.stats.lines, 6);
    }

    #[test]
    fn decoding_is_deterministic() {
        let input = text(DEG_DB_HEADER, &["0 0 3 1 10 2 20 1", "5 0 4 1 10 2 20 1"]);
        let a = TabularDataset::read(Cursor::new(input.clone())).unwrap();
        let b = TabularDataset::read(Cursor::new(input)).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.theta_range, b.theta_range);
        assert_eq!(a.phi_range, b.phi_range);
    }

    #[test]
    fn bad_row_is_a_data_error_with_line() {
        let input = text(DEG_DB_HEADER, &["0 0 1 1 0 1 0 0", "0 0 1 x 0 1 0 0"]);
        let err = TabularDataset::read(Cursor::new(input)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        match err {
            PatternError::Data { line, text, .. } => {
                assert_eq!(line, Some(4));
                assert_eq!(text, "0 0 1 x 0 1 0 0");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn short_row_is_a_data_error() {
        let input = text(DEG_DB_HEADER, &["0 0 1 1 0 1 0"]);
        let err = TabularDataset::read(Cursor::new(input)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = TabularDataset::read(Cursor::new("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn header_only_input_is_empty() {
        let dataset = TabularDataset::read(Cursor::new(format!("{DEG_DB_HEADER}\n"))).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.theta_range, None);
    }

    #[tokio::test]
    async fn loads_from_path() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(text(DEG_DB_HEADER, &["10 20 0 0 0 0 0 0"]).as_bytes())
            .unwrap();
        let path = temp.into_temp_path();
        let dataset = TabularDataset::load_path(&path, None).await.unwrap();
        assert_eq!(dataset.samples[0].angle, AngleCoordinate::new(10.0, 20.0));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = TabularDataset::load_path("/nonexistent/pattern.txt", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn cancelled_load_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let input = text(DEG_DB_HEADER, &["0 0 1 1 0 1 0 0"]);
        let err = TabularDataset::load_stream(input.as_bytes(), Some(&token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn cancellation_during_pending_read_is_reported() {
        let (client, mut server) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        let canceller = token.clone();

        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server
                .write_all(format!("{DEG_DB_HEADER}\n{RULE}\n").as_bytes())
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
            // Keep the pipe open so the read is still pending when cancelled.
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            drop(server);
        });

        let err = TabularDataset::load_stream(client, Some(&token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        writer.await.unwrap();
    }
}
