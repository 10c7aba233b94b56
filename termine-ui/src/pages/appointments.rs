//! Manage Appointments Page
//!
//! Create one day of appointment slots and preview their start times.

use leptos::*;

use termine_admin::AppointmentBatch;

use crate::api::AdminApi;
use crate::config::AdminConfig;
use crate::state::GlobalState;

/// Raw text of the appointment form inputs
#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchForm {
    day: String,
    month: String,
    year: String,
    start_hour: String,
    start_min: String,
    num_slots: String,
    per_slot: String,
    slot_duration: String,
}

impl From<&AppointmentBatch> for BatchForm {
    fn from(batch: &AppointmentBatch) -> Self {
        Self {
            day: batch.day.to_string(),
            month: batch.month.to_string(),
            year: batch.year.to_string(),
            start_hour: batch.start_hour.to_string(),
            start_min: batch.start_min.to_string(),
            num_slots: batch.num_slots.to_string(),
            per_slot: batch.num_appointment_per_slot.to_string(),
            slot_duration: batch.slot_duration_min.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Day,
    Month,
    Year,
    StartHour,
    StartMin,
    NumSlots,
    PerSlot,
    SlotDuration,
}

fn parse_field<T: std::str::FromStr>(label: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a number", label))
}

impl BatchForm {
    fn value(&self, field: FormField) -> &String {
        match field {
            FormField::Day => &self.day,
            FormField::Month => &self.month,
            FormField::Year => &self.year,
            FormField::StartHour => &self.start_hour,
            FormField::StartMin => &self.start_min,
            FormField::NumSlots => &self.num_slots,
            FormField::PerSlot => &self.per_slot,
            FormField::SlotDuration => &self.slot_duration,
        }
    }

    fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::Day => &mut self.day,
            FormField::Month => &mut self.month,
            FormField::Year => &mut self.year,
            FormField::StartHour => &mut self.start_hour,
            FormField::StartMin => &mut self.start_min,
            FormField::NumSlots => &mut self.num_slots,
            FormField::PerSlot => &mut self.per_slot,
            FormField::SlotDuration => &mut self.slot_duration,
        };
        *slot = value;
    }

    fn to_batch(&self) -> Result<AppointmentBatch, String> {
        let batch = AppointmentBatch {
            day: parse_field("Day", &self.day)?,
            month: parse_field("Month", &self.month)?,
            year: parse_field("Year", &self.year)?,
            start_hour: parse_field("Start hour", &self.start_hour)?,
            start_min: parse_field("Start minute", &self.start_min)?,
            num_slots: parse_field("Slots", &self.num_slots)?,
            num_appointment_per_slot: parse_field("Appointments per slot", &self.per_slot)?,
            slot_duration_min: parse_field("Slot duration", &self.slot_duration)?,
        };
        batch.validate().map_err(|e| e.to_string())?;
        Ok(batch)
    }
}

/// Slot start times as shown in the preview
fn preview_lines(batch: &AppointmentBatch) -> Vec<String> {
    batch
        .slot_starts()
        .map(|starts| {
            starts
                .iter()
                .map(|start| start.format("%H:%M").to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[component]
pub fn ManageAppointments(config: AdminConfig) -> impl IntoView {
    let global = use_context::<GlobalState>().expect("GlobalState not found");
    let api = store_value(AdminApi::new(config.api_base_url));

    let form = create_rw_signal(BatchForm::from(&AppointmentBatch::default()));
    let (submitting, set_submitting) = create_signal(false);
    let batch = create_memo(move |_| form.with(BatchForm::to_batch));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let batch = match batch.get() {
            Ok(batch) => batch,
            Err(e) => {
                global.show_error(&e);
                return;
            }
        };

        set_submitting.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.add_appointments(&batch).await {
                Ok(()) => global.show_success(&format!(
                    "Created {} appointments on {}.{}.{}",
                    batch.total_appointments(),
                    batch.day,
                    batch.month,
                    batch.year
                )),
                Err(e) => global.show_api_error("Creating appointments", &e),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Manage Appointments"</h1>
                <p class="text-gray-400 mt-1">{config.instance_name}</p>
            </div>

            <form on:submit=on_submit class="bg-gray-800 rounded-xl p-6 space-y-6">
                <div class="grid md:grid-cols-3 gap-4">
                    <NumberField label="Day" form=form field=FormField::Day />
                    <NumberField label="Month" form=form field=FormField::Month />
                    <NumberField label="Year" form=form field=FormField::Year />
                </div>
                <div class="grid md:grid-cols-5 gap-4">
                    <NumberField label="Start hour" form=form field=FormField::StartHour />
                    <NumberField label="Start minute" form=form field=FormField::StartMin />
                    <NumberField label="Slots" form=form field=FormField::NumSlots />
                    <NumberField label="Per slot" form=form field=FormField::PerSlot />
                    <NumberField label="Minutes per slot" form=form field=FormField::SlotDuration />
                </div>

                {move || batch.get().err().map(|e| view! {
                    <p class="text-sm text-red-400">{e}</p>
                })}

                <button
                    type="submit"
                    disabled=move || submitting.get() || batch.with(Result::is_err)
                    class="px-6 py-3 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                           rounded-lg font-medium transition-colors"
                >
                    {move || if submitting.get() { "Creating..." } else { "Create appointments" }}
                </button>
            </form>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Preview"</h2>
                {move || match batch.get() {
                    Ok(batch) => view! {
                        <div>
                            <p class="text-gray-400 mb-4">
                                {format!("{} appointments in total", batch.total_appointments())}
                            </p>
                            <ul class="grid grid-cols-4 md:grid-cols-8 gap-2">
                                {preview_lines(&batch).into_iter().map(|line| view! {
                                    <li class="bg-gray-700 rounded px-2 py-1 text-center">{line}</li>
                                }).collect_view()}
                            </ul>
                        </div>
                    }.into_view(),
                    Err(_) => view! {
                        <p class="text-gray-400">"Fix the form to see the slots"</p>
                    }.into_view(),
                }}
            </section>
        </div>
    }
}

#[component]
fn NumberField(
    label: &'static str,
    form: RwSignal<BatchForm>,
    field: FormField,
) -> impl IntoView {
    view! {
        <div>
            <label class="block text-sm text-gray-400 mb-2">{label}</label>
            <input
                type="number"
                min="0"
                prop:value=move || form.with(|f| f.value(field).clone())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    form.update(|f| f.set(field, value));
                }
                class="w-full bg-gray-700 rounded-lg px-4 py-3
                       border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
        </div>
    }
}
