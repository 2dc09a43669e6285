use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    #[schema(example = "jane@dayflow.com")]
    pub email: Option<String>,
    #[schema(example = "secret123")]
    pub password: Option<String>,
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "Developer")]
    pub job_title: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@dayflow.com")]
    pub email: Option<String>,
    #[schema(example = "admin123")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Login email
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}
