//! Label generation: template + counter + codec + filler.
//!
//! A request moves through
//! `ResolvingTemplate → ReadingCounter → (ComputingPreview | ValidatingRange
//! → RenderingBatch → PersistingCounter) → Done`, and any stage may fail.
//! Nothing is written before `PersistingCounter`, and only print mode gets
//! there.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::counter::{CounterRecord, CounterStore};
use crate::fill::{FieldMap, FieldValue, fill};
use crate::julian::{Clock, SystemClock, julian_code, julian_date};
use crate::label_id::{EntropyLabelIds, LabelIdSource, stable_label_id};
use crate::lock::PartLocks;
use crate::retry::RetryPolicy;
use crate::serial::{self, NumberingScheme};
use crate::template::TemplateSource;
use crate::{GenerateResponse, LabelError, LabelRequest, Part, RenderMode};

/// Placeholder names filled for every unit.
pub mod fields {
    /// Part number.
    pub const PARTNUM: &str = "PARTNUM";
    /// Serial prefix of the part.
    pub const SERIALPREFIX: &str = "SERIALPREFIX";
    /// The unit's serial.
    pub const SERIALNUM1: &str = "SERIALNUM1";
    /// Julian date code.
    pub const JDATE: &str = "JDATE";
    /// Copies per unit (always 1).
    pub const NUMCOPIES: &str = "NUMCOPIES";
    /// Part description.
    pub const DESCRIPTION: &str = "DESCRIPTION";
    /// Short per-unit label id (print and reprint only).
    pub const ID_LABEL: &str = "ID_LABEL";
}

/// Reprint sentinel meaning "start at the counter's `next`".
pub const NEXT_SERIAL_SENTINEL: &str = "0";

#[derive(Debug, Clone, Copy)]
enum Stage {
    ResolvingTemplate,
    ReadingCounter,
    ComputingPreview,
    ValidatingRange,
    RenderingBatch,
    PersistingCounter,
}

/// Generates filled ZPL for parts and allocates their serials.
///
/// Print requests for one part are serialized in-process; requests for
/// different parts run concurrently.
pub struct LabelService<T, S> {
    templates: T,
    store: S,
    locks: PartLocks,
    clock: Arc<dyn Clock>,
    label_ids: Arc<dyn LabelIdSource>,
    retry: RetryPolicy,
}

impl<T: TemplateSource, S: CounterStore> LabelService<T, S> {
    /// A service using the system clock and random label ids.
    pub fn new(templates: T, store: S) -> Self {
        Self {
            templates,
            store,
            locks: PartLocks::new(),
            clock: Arc::new(SystemClock),
            label_ids: Arc::new(EntropyLabelIds::new()),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the label id source used by print mode.
    pub fn with_label_ids(mut self, ids: impl LabelIdSource + 'static) -> Self {
        self.label_ids = Arc::new(ids);
        self
    }

    /// Replace the retry policy for counter reads.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The template source.
    pub fn templates(&self) -> &T {
        &self.templates
    }

    /// The counter store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a wire request and fold the outcome into a response envelope.
    pub fn generate(&self, request: &LabelRequest) -> GenerateResponse {
        let mode = match request.mode.parse::<RenderMode>() {
            Ok(mode) => mode,
            Err(err) => {
                warn!(mode = %request.mode, "rejected label request");
                return GenerateResponse::failure(err);
            }
        };
        let result = match mode {
            RenderMode::Preview => self.preview(&request.part),
            RenderMode::Print => self.print(&request.part, request.quantity),
            RenderMode::Reprint => self.reprint(
                &request.part,
                request.date.as_deref(),
                request.serial_number.as_deref(),
                request.quantity,
            ),
        };
        if let Err(err) = &result {
            warn!(
                part = %request.part.part_number,
                %mode,
                code = err.code(),
                error = %err,
                "label request failed"
            );
        }
        GenerateResponse::from_result(mode, result)
    }

    /// One label showing the next serial. Never writes.
    pub fn preview(&self, part: &Part) -> Result<String, LabelError> {
        let template = self.resolve_template(part)?;
        let record = self.read_counter(part)?;

        stage(part, Stage::ComputingPreview);
        let jdate = julian_code(self.clock.today());
        let values = unit_fields(part, &record.next, &jdate, None);
        Ok(fill(template, &values))
    }

    /// Allocate `quantity` serials and render them as one batch.
    ///
    /// The counter is advanced once, after every unit has rendered.
    pub fn print(&self, part: &Part, quantity: u32) -> Result<String, LabelError> {
        check_quantity(quantity)?;
        self.locks
            .with_part(&part.part_number, || self.print_locked(part, quantity))
    }

    fn print_locked(&self, part: &Part, quantity: u32) -> Result<String, LabelError> {
        let template = self.resolve_template(part)?;
        let record = self.read_counter(part)?;
        let scheme: NumberingScheme = record.scheme.parse()?;

        stage(part, Stage::ValidatingRange);
        check_range(&record, scheme, quantity)?;

        stage(part, Stage::RenderingBatch);
        let jdate = julian_code(self.clock.today());
        let mut batch = String::with_capacity(template.len().saturating_mul(quantity as usize));
        for i in 0..u64::from(quantity) {
            let serial = serial::advance(&record.next, i, scheme)?;
            let id = self.label_ids.label_id(&part.part_number, &serial);
            let values = unit_fields(part, &serial, &jdate, Some(id));
            batch.push_str(&fill(template, &values));
        }
        let new_next = serial::advance(&record.next, u64::from(quantity), scheme)?;

        stage(part, Stage::PersistingCounter);
        if let Err(source) = self.store.advance_cursor(&part.part_number, &new_next) {
            error!(
                part = %part.part_number,
                first = %record.next,
                next = %new_next,
                error = %source,
                "batch rendered but counter was not advanced"
            );
            return Err(LabelError::CommitFailed {
                part: part.part_number.clone(),
                batch,
                source,
            });
        }

        info!(
            part = %part.part_number,
            quantity,
            first = %record.next,
            next = %new_next,
            "allocated serials"
        );
        Ok(batch)
    }

    /// Re-render serials starting at `start_serial` (or the counter's `next` when
    /// absent or `"0"`). Never validates the range, never writes.
    ///
    /// `date` sets the julian code when it parses; otherwise today is used.
    pub fn reprint(
        &self,
        part: &Part,
        date: Option<&str>,
        start_serial: Option<&str>,
        quantity: u32,
    ) -> Result<String, LabelError> {
        check_quantity(quantity)?;
        let template = self.resolve_template(part)?;
        let record = self.read_counter(part)?;
        let scheme: NumberingScheme = record.scheme.parse()?;

        let base = match start_serial.map(str::trim) {
            Some(s) if !s.is_empty() && s != NEXT_SERIAL_SENTINEL => s.to_string(),
            _ => record.next,
        };

        stage(part, Stage::RenderingBatch);
        let jdate = julian_date(date, self.clock.today());
        let mut batch = String::new();
        for i in 0..u64::from(quantity) {
            let serial = serial::advance(&base, i, scheme)?;
            let id = stable_label_id(&part.part_number, &serial, &jdate);
            let values = unit_fields(part, &serial, &jdate, Some(id));
            batch.push_str(&fill(template, &values));
        }
        info!(part = %part.part_number, quantity, first = %base, "reprinted serials");
        Ok(batch)
    }

    fn resolve_template(&self, part: &Part) -> Result<&str, LabelError> {
        stage(part, Stage::ResolvingTemplate);
        self.templates.fetch(&part.label_format)
    }

    fn read_counter(&self, part: &Part) -> Result<CounterRecord, LabelError> {
        stage(part, Stage::ReadingCounter);
        self.retry
            .run("read_cursor", || self.store.read_cursor(&part.part_number))
            .map_err(LabelError::from)
    }
}

fn stage(part: &Part, stage: Stage) {
    debug!(part = %part.part_number, ?stage, "label request");
}

fn check_quantity(quantity: u32) -> Result<(), LabelError> {
    if quantity == 0 {
        return Err(LabelError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// `next + quantity - 1 <= max_id`, or report how many serials remain.
fn check_range(
    record: &CounterRecord,
    scheme: NumberingScheme,
    quantity: u32,
) -> Result<(), LabelError> {
    let first = serial::decode(&record.next, scheme)?;
    let last = first.checked_add(u64::from(quantity) - 1);
    if last.is_none_or(|last| last > record.max_id) {
        let remaining = if first > record.max_id {
            0
        } else {
            (record.max_id - first).saturating_add(1)
        };
        return Err(LabelError::SerialRangeExceeded { remaining });
    }
    Ok(())
}

fn unit_fields(part: &Part, serial: &str, jdate: &str, label_id: Option<String>) -> FieldMap {
    let mut values = FieldMap::new();
    values.insert(fields::PARTNUM.into(), part.part_number.as_str().into());
    values.insert(fields::SERIALPREFIX.into(), part.serial_prefix.as_str().into());
    values.insert(fields::SERIALNUM1.into(), serial.into());
    values.insert(fields::JDATE.into(), jdate.into());
    values.insert(fields::NUMCOPIES.into(), FieldValue::Number(1));
    values.insert(fields::DESCRIPTION.into(), part.description.as_str().into());
    if let Some(id) = label_id {
        values.insert(fields::ID_LABEL.into(), id.into());
    }
    values
}
