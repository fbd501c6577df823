use super::domain::{FieldMap, Record, SectionData, SectionKey};

/// Return a copy of `record` with the section named by `data` replaced wholesale.
pub fn merge(record: &Record, data: SectionData) -> Record {
    let mut merged = record.clone();
    merged.replace(data);
    merged
}

impl Record {
    /// Replace exactly one section; every other section is left as it was.
    pub fn replace(&mut self, data: SectionData) {
        match data {
            SectionData::PersonalInfo(info) => self.personal_info = info,
            SectionData::Insurance(insurance) => self.insurance = insurance,
            SectionData::MedicalHistory(history) => self.medical_history = history,
            SectionData::EmergencyContacts(contacts) => self.emergency_contacts = contacts,
            SectionData::Consent(consent) => self.consent = consent,
        }
    }

    pub fn section(&self, key: SectionKey) -> SectionData {
        match key {
            SectionKey::PersonalInfo => SectionData::PersonalInfo(self.personal_info.clone()),
            SectionKey::Insurance => SectionData::Insurance(self.insurance.clone()),
            SectionKey::MedicalHistory => SectionData::MedicalHistory(self.medical_history.clone()),
            SectionKey::EmergencyContacts => {
                SectionData::EmergencyContacts(self.emergency_contacts.clone())
            }
            SectionKey::Consent => SectionData::Consent(self.consent),
        }
    }

    pub fn section_values(&self, key: SectionKey) -> FieldMap {
        self.section(key).to_fields()
    }
}
