use rocket::serde::json::Json;
use rocket::{get, State};

use crate::auth::AuthUser;
use crate::repo::Author;
use crate::state::Conduit;
use crate::types::ApiResult;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    profile: Profile,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: bool,
}

impl From<Author> for Profile {
    fn from(author: Author) -> Profile {
        Profile {
            username: author.username,
            bio: author.bio,
            image: author.image,
            // TODO: follow relations are not stored yet; report false until they are.
            following: false,
        }
    }
}

#[get("/profiles/<name>")]
pub async fn profile(conduit: &State<Conduit>, _viewer: Option<AuthUser>, name: String) -> ApiResult<ProfileResponse> {
    let user = conduit.run(move |store| Ok(store.user_by_username(&name)?)).await?;
    let profile = Profile::from(Author::from(&user));
    Ok(Json(ProfileResponse { profile }))
}
