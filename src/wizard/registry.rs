// Field registry - declarative definitions for every wizard step
//
// The validator, sequencer and JSON decoder all key off the names declared
// here, so a field renamed in one place must be renamed in the registry too.

/// Answer used by every yes/no select in the form.
pub const YES: &str = "نعم";
pub const NO: &str = "لا";

/// Reserved facility code option that unlocks the manual code field.
pub const CODE_NOT_FOUND: &str = "الكود غير موجود";

/// Upper bound on device or sample rows; larger counts are clamped and flagged.
pub const MAX_ROWS: usize = 50;

/// Suffix appended to a label to build the "is required" message.
pub const REQUIRED_SUFFIX: &str = "مطلوب";

const YES_NO: &[&str] = &[YES, NO];

/// Logical identity of a wizard step, independent of its index in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    VisitInfo,
    Devices,
    Samples,
    Violations,
    Fines,
    Inspectors,
    Confirmation,
}

impl StepId {
    pub fn title(self) -> &'static str {
        match self {
            StepId::VisitInfo => "معلومات الزيارة",
            StepId::Devices => "الأجهزة البيئية",
            StepId::Samples => "تفاصيل العينات",
            StepId::Violations => "المخالفات والإجراءات",
            StepId::Fines => "الغرامات المالية",
            StepId::Inspectors => "معلومات المفتشين",
            StepId::Confirmation => "المراجعة والتأكيد",
        }
    }

    /// Steps that only exist while the report records a violation.
    pub fn requires_violation(self) -> bool {
        matches!(self, StepId::Violations | StepId::Fines)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slug = match self {
            StepId::VisitInfo => "visit-info",
            StepId::Devices => "devices",
            StepId::Samples => "samples",
            StepId::Violations => "violations",
            StepId::Fines => "fines",
            StepId::Inspectors => "inspectors",
            StepId::Confirmation => "confirmation",
        };
        f.write_str(slug)
    }
}

/// Input widget behind a field. Decides how JSON input is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Select,
    Number,
    Money,
    DateTime,
    Image,
    DeviceList,
    SampleList,
}

/// When a field becomes mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    Always,
    /// Required when another field holds exactly the given value.
    When { field: &'static str, equals: &'static str },
}

/// Declarative description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub options: &'static [&'static str],
    pub requirement: Requirement,
}

impl FieldDef {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            options: &[],
            requirement: Requirement::Optional,
        }
    }

    const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            options,
            ..Self::new(name, label, FieldKind::Select)
        }
    }

    const fn required(mut self) -> Self {
        self.requirement = Requirement::Always;
        self
    }

    const fn required_when(mut self, field: &'static str, equals: &'static str) -> Self {
        self.requirement = Requirement::When { field, equals };
        self
    }

    pub fn required_message(&self) -> String {
        format!("{} {}", self.label, REQUIRED_SUFFIX)
    }
}

/// Columns of the repeating sub-record rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowColumn {
    Name,
    Type,
    Number,
}

impl RowColumn {
    pub fn key(self) -> &'static str {
        match self {
            RowColumn::Name => "name",
            RowColumn::Type => "type",
            RowColumn::Number => "number",
        }
    }
}

/// Which repeating list a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowList {
    Devices,
    Samples,
}

impl RowList {
    pub fn field(self) -> &'static str {
        match self {
            RowList::Devices => "devices",
            RowList::Samples => "samples",
        }
    }

    pub fn count_field(self) -> &'static str {
        match self {
            RowList::Devices => "deviceCount",
            RowList::Samples => "sampleCount",
        }
    }

    pub fn answer_field(self) -> &'static str {
        match self {
            RowList::Devices => "hasDevices",
            RowList::Samples => "hasSamples",
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            RowList::Devices => "device",
            RowList::Samples => "sample",
        }
    }

    /// Label of a row column, as shown next to the input.
    pub fn column_label(self, column: RowColumn) -> &'static str {
        match (self, column) {
            (RowList::Devices, RowColumn::Number) => "رقم الجهاز",
            (RowList::Devices, _) => "اسم الجهاز",
            (RowList::Samples, RowColumn::Number) => "رقم العينة",
            (RowList::Samples, _) => "نوع العينة",
        }
    }

    pub fn columns(self) -> [RowColumn; 2] {
        match self {
            RowList::Devices => [RowColumn::Name, RowColumn::Number],
            RowList::Samples => [RowColumn::Type, RowColumn::Number],
        }
    }
}

const VISIT_INFO: &[FieldDef] = &[
    FieldDef::new("facilityName", "اسم المنشأة", FieldKind::Text).required(),
    FieldDef::select(
        "facilityCode",
        "كود المنشأة",
        &["F-001", "F-002", "F-003", "F-004", "F-005", CODE_NOT_FOUND],
    )
    .required(),
    FieldDef::new("customFacilityCode", "كود المنشأة اليدوي", FieldKind::Text)
        .required_when("facilityCode", CODE_NOT_FOUND),
    FieldDef::select(
        "branch",
        "الفرع",
        &["الفرع الرئيسي", "الفرع الشمالي", "الفرع الجنوبي", "الفرع الشرقي", "الفرع الغربي"],
    )
    .required(),
    FieldDef::select("facilityType", "نوع المنشأة", &["مصنع", "مستودع", "محل تجاري", "مكتب", "ورشة"])
        .required(),
    FieldDef::select("activityType", "نوع النشاط", &["صناعي", "تجاري", "خدمي", "زراعي", "صحي"])
        .required(),
    FieldDef::select(
        "activityCategory",
        "فئة النشاط",
        &["الفئة الأولى", "الفئة الثانية", "الفئة الثالثة", "الفئة الرابعة"],
    )
    .required(),
    FieldDef::select(
        "region",
        "المنطقة",
        &["الرياض", "مكة المكرمة", "المدينة المنورة", "الشرقية", "عسير", "جازان", "تبوك"],
    )
    .required(),
    FieldDef::select("city", "المدينة", &["الرياض", "جدة", "مكة", "المدينة", "الدمام", "أبها", "تبوك"])
        .required(),
    FieldDef::select(
        "facilityStatus",
        "حالة المنشأة",
        &["نشطة", "متوقفة مؤقتاً", "متوقفة نهائياً", "تحت الإنشاء"],
    )
    .required(),
    FieldDef::select("dataUpdated", "هل تم تحديث بيانات المنشأة؟", YES_NO).required(),
    FieldDef::select("complianceStatus", "حالة الالتزام", &["ملتزم", "غير ملتزم", "ملتزم جزئياً"])
        .required(),
    FieldDef::select(
        "visitCategory",
        "تصنيف الزيارة",
        &["زيارة دورية", "زيارة طارئة", "زيارة متابعة", "زيارة استقصائية"],
    )
    .required(),
    FieldDef::select("addedToDatabase", "هل قمت بإضافة المنشأة لقاعدة البيانات؟", YES_NO).required(),
    FieldDef::select("sector", "القطاع", &["القطاع الحكومي", "القطاع الخاص", "القطاع المختلط"])
        .required(),
    FieldDef::new("inspectionImage", "صورة التفتيش", FieldKind::Image).required(),
    FieldDef::select("hasViolation", "هل توجد مخالفة؟", YES_NO).required(),
    FieldDef::select("violationType", "نوع المخالفة", &["مخالفة إدارية", "مخالفة فنية", "مخالفة بيئية"])
        .required_when("hasViolation", YES),
    // Stamped by `FormData::initial`, never entered by hand.
    FieldDef::new("visitDateTime", "تاريخ ووقت الزيارة", FieldKind::DateTime),
];

const DEVICES: &[FieldDef] = &[
    FieldDef::select("hasDevices", "هل تم استخدام أجهزة بيئية؟", YES_NO).required(),
    FieldDef::new("deviceCount", "عدد الأجهزة المستخدمة", FieldKind::Number)
        .required_when("hasDevices", YES),
    FieldDef::new("devices", "قائمة الأجهزة", FieldKind::DeviceList).required_when("hasDevices", YES),
];

const SAMPLES: &[FieldDef] = &[
    FieldDef::select("hasSamples", "هل تم سحب عينات؟", YES_NO).required(),
    FieldDef::new("sampleCount", "عدد العينات التي تم سحبها", FieldKind::Number)
        .required_when("hasSamples", YES),
    FieldDef::new("samples", "قائمة العينات", FieldKind::SampleList).required_when("hasSamples", YES),
];

const REGULATIONS: &[&str] = &[
    "المادة 5 - الفقرة 1",
    "المادة 5 - الفقرة 2",
    "المادة 7 - الفقرة 1",
    "المادة 7 - الفقرة 3",
    "المادة 10 - الفقرة 1",
    "المادة 12 - الفقرة 2",
    "المادة 15 - الفقرة 1",
];

const VIOLATIONS: &[FieldDef] = &[
    FieldDef::select(
        "violation2Type",
        "المخالفة رقم 2 – نوع المخالفة",
        &[
            "عدم الالتزام بالاشتراطات البيئية",
            "تلوث بيئي",
            "تصريف غير قانوني",
            "عدم وجود تراخيص",
            "مخالفة بناء",
            "أخرى",
        ],
    )
    .required(),
    FieldDef::select("regulation1", "اللائحة التنفيذية – رقم 1", REGULATIONS).required(),
    FieldDef::select("regulation2", "اللائحة التنفيذية – رقم 2", REGULATIONS).required(),
];

const FINES: &[FieldDef] = &[
    FieldDef::new("fine1", "مقترح قيمة المخالفة رقم 1 (ريال سعودي)", FieldKind::Money).required(),
    FieldDef::new("fine2", "مقترح قيمة المخالفة رقم 2 (ريال سعودي)", FieldKind::Money).required(),
];

const INSPECTORS: &[FieldDef] = &[
    FieldDef::new("mainInspectorName", "اسم المفتش الرئيسي", FieldKind::Text).required(),
    FieldDef::new("mainInspectorTitle", "المسمى الوظيفي", FieldKind::Text).required(),
    FieldDef::select("hasAssistantInspector", "هل يوجد مفتش مساعد؟", YES_NO).required(),
    FieldDef::new("assistantInspectorName", "اسم المفتش المساعد", FieldKind::Text)
        .required_when("hasAssistantInspector", YES),
    FieldDef::new("assistantInspectorTitle", "المسمى الوظيفي للمفتش المساعد", FieldKind::Text),
];

/// Field definitions of a step, in display order.
pub fn fields_for(step: StepId) -> &'static [FieldDef] {
    match step {
        StepId::VisitInfo => VISIT_INFO,
        StepId::Devices => DEVICES,
        StepId::Samples => SAMPLES,
        StepId::Violations => VIOLATIONS,
        StepId::Fines => FINES,
        StepId::Inspectors => INSPECTORS,
        StepId::Confirmation => &[],
    }
}

const ALL_STEPS: [StepId; 7] = [
    StepId::VisitInfo,
    StepId::Devices,
    StepId::Samples,
    StepId::Violations,
    StepId::Fines,
    StepId::Inspectors,
    StepId::Confirmation,
];

/// Look a field up by name across all steps.
pub fn field(name: &str) -> Option<&'static FieldDef> {
    ALL_STEPS
        .iter()
        .flat_map(|step| fields_for(*step).iter())
        .find(|def| def.name == name)
}

/// Label for a field name, falling back to the name itself.
pub fn label_of(name: &str) -> &str {
    field(name).map(|def| def.label).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_names_are_unique() {
        let mut seen = HashSet::new();
        for step in ALL_STEPS {
            for def in fields_for(step) {
                assert!(seen.insert(def.name), "duplicate field {}", def.name);
            }
        }
    }

    #[test]
    fn visit_info_has_sixteen_unconditional_fields() {
        let always = fields_for(StepId::VisitInfo)
            .iter()
            .filter(|def| def.requirement == Requirement::Always)
            .count();
        assert_eq!(always, 16);
    }

    #[test]
    fn conditional_fields_point_at_registered_fields() {
        for step in ALL_STEPS {
            for def in fields_for(step) {
                if let Requirement::When { field: trigger, .. } = def.requirement {
                    assert!(field(trigger).is_some(), "{} depends on unknown {}", def.name, trigger);
                }
            }
        }
    }

    #[test]
    fn sentinel_is_a_facility_code_option() {
        let code = field("facilityCode").unwrap();
        assert!(code.options.contains(&CODE_NOT_FOUND));
        assert_eq!(label_of("unknownField"), "unknownField");
    }
}
