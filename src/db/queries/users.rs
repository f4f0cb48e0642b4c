use super::*;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Partial update for a user. Only the fields that are present change;
/// anything else is left exactly as stored.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl Database {
    /// Creates a subscriber account. Onboarding is the only caller; the
    /// portal itself never creates users.
    pub async fn create_user(&self, params: &CreateUserParams) -> Result<user::Model> {
        if params.name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        if params.email.trim().is_empty() {
            return Err(Error::Validation("email must not be empty".into()));
        }

        self.transaction(|tx| async move {
            let now = Utc::now().naive_utc();
            Ok(user::Entity::insert(user::ActiveModel {
                name: ActiveValue::set(params.name.trim().to_string()),
                email: ActiveValue::set(params.email.trim().to_string()),
                phone: ActiveValue::set(params.phone.clone()),
                status: ActiveValue::set(UserStatus::Active),
                created_at: ActiveValue::set(now),
                updated_at: ActiveValue::set(now),
                ..Default::default()
            })
            .exec_with_returning(&*tx)
            .await?)
        })
        .await
    }

    /// Returns the user with the specified ID.
    pub async fn get_user(&self, id: UserId) -> Result<user::Model> {
        self.transaction(|tx| async move {
            user::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no user with id {id}")))
        })
        .await
    }

    /// Returns the user with the specified email address, if any.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        self.transaction(|tx| async move {
            Ok(user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(&*tx)
                .await?)
        })
        .await
    }

    /// Returns all users, most recently created first. A filter, when
    /// given, is matched case-insensitively against any part of the name.
    pub async fn get_users(&self, name_filter: Option<&str>) -> Result<Vec<user::Model>> {
        self.transaction(|tx| async move {
            let mut condition = Condition::all();
            if let Some(filter) = name_filter {
                if !filter.trim().is_empty() {
                    condition = condition.add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                            .like(format!("%{}%", filter.trim().to_lowercase())),
                    );
                }
            }

            Ok(user::Entity::find()
                .filter(condition)
                .order_by_desc(user::Column::CreatedAt)
                .order_by_desc(user::Column::Id)
                .all(&*tx)
                .await?)
        })
        .await
    }

    /// Applies the provided fields to the user and stamps `updated_at`.
    /// Setting status to `canceled` cancels the account; it does not touch
    /// the user's subscriptions, which carry their own statuses.
    pub async fn update_user(&self, id: UserId, params: &UpdateUserParams) -> Result<user::Model> {
        let status = params
            .status
            .as_deref()
            .map(parse_user_status)
            .transpose()?;

        self.transaction(|tx| async move {
            let user = user::Entity::find_by_id(id)
                .one(&*tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no user with id {id}")))?;

            let mut user = user.into_active_model();
            if let Some(name) = &params.name {
                user.name = ActiveValue::set(name.clone());
            }
            if let Some(email) = &params.email {
                user.email = ActiveValue::set(email.clone());
            }
            if let Some(phone) = &params.phone {
                user.phone = ActiveValue::set((!phone.is_empty()).then(|| phone.clone()));
            }
            if let Some(status) = status {
                user.status = ActiveValue::set(status);
            }
            user.updated_at = ActiveValue::set(Utc::now().naive_utc());

            Ok(user.update(&*tx).await?)
        })
        .await
    }
}

fn parse_user_status(status: &str) -> Result<UserStatus> {
    status
        .parse()
        .map_err(|_| Error::Validation(format!("unrecognized user status {status:?}")))
}
