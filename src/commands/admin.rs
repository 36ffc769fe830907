use crate::app::App;
use crate::commands::Out;
use crate::Result;
use anyhow::bail;
use tracing::debug;

/// Turns admin mode on when `password` matches the configured one. There is no expiry.
pub async fn admin_login(app: &mut App, password: &str) -> Result<Out<bool>> {
    if password != app.config().admin_password() {
        bail!("The admin password is incorrect");
    }
    app.session_mut().set_admin(true);
    app.save_session().await?;
    debug!("Admin mode is on");
    Ok(Out::new("Admin mode is on", true))
}

pub async fn admin_logout(app: &mut App) -> Result<Out<bool>> {
    app.session_mut().set_admin(false);
    app.save_session().await?;
    Ok(Out::new("Admin mode is off", false))
}

pub async fn admin_status(app: &App) -> Result<Out<bool>> {
    let is_admin = app.session().is_admin();
    let message = if is_admin {
        "Admin mode is on"
    } else {
        "Admin mode is off"
    };
    Ok(Out::new(message, is_admin))
}
