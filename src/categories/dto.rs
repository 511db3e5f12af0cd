use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub is_income: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedCategory {
    pub id: i64,
}
