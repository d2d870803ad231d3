/// Company the user belongs to, as referenced by the identity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRef {
    pub id: String,
    pub name: String,
}

/// Identity record fetched once after authentication. Read-only on the
/// client; the backend owns every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_picture_url: Option<String>,
    pub company: Option<CompanyRef>,
}
