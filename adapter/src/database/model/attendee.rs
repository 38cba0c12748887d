use kernel::model::{attendee::Attendee, id::AttendeeId};

#[derive(sqlx::FromRow)]
pub struct AttendeeRow {
    pub attendee_id: AttendeeId,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub image_url: Option<String>,
    pub is_external: bool,
    pub attendee_type: Option<String>,
}

impl From<AttendeeRow> for Attendee {
    fn from(value: AttendeeRow) -> Self {
        let AttendeeRow {
            attendee_id,
            name,
            email,
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        } = value;
        Attendee {
            id: attendee_id,
            name,
            email,
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        }
    }
}
