use crate::api::Token;
use crate::app::App;
use crate::commands::Out;
use crate::Result;
use anyhow::Context;

/// Checks `token` against the repository and stores it. A token that GitHub rejects is not
/// stored.
pub async fn token_set(app: &mut App, token: &str) -> Result<Out<bool>> {
    app.require_admin()?;
    let token = Token::new(token).context("The token must not be empty")?;
    app.persistence()
        .check_token(&token)
        .await
        .context("GitHub did not accept the token")?;
    app.session_mut().set_token(Some(token));
    app.save_session().await?;
    Ok(Out::new(
        "The GitHub token was verified and stored, changes will be saved to GitHub",
        true,
    ))
}

pub async fn token_remove(app: &mut App) -> Result<Out<bool>> {
    app.session_mut().set_token(None);
    app.save_session().await?;
    Ok(Out::new(
        "The GitHub token was removed, changes will only be saved locally",
        false,
    ))
}

pub async fn token_status(app: &App) -> Result<Out<bool>> {
    let is_set = app.persistence().token().is_some();
    let message = if is_set {
        "A GitHub token is stored"
    } else {
        "No GitHub token is stored, changes are only saved locally"
    };
    Ok(Out::new(message, is_set))
}
