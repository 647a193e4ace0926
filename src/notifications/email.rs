//! SMTP notifier built on lettre.

use crate::config::SmtpConfig;
use crate::entities::{request, request_item};
use crate::notifications::{NotificationError, Notifier};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

/// Sends lifecycle notifications as HTML mail over SMTP.
#[derive(Clone)]
pub struct SmtpNotifier {
    server: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
    warehouse_email: String,
    app_base_url: String,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, app_base_url: impl Into<String>) -> Self {
        Self {
            server: smtp.server.clone(),
            port: smtp.port,
            credentials: Credentials::new(smtp.username.clone(), smtp.password.clone()),
            from_email: smtp.from_email.clone(),
            from_name: smtp.from_name.clone(),
            warehouse_email: smtp.warehouse_email.clone(),
            app_base_url: app_base_url.into(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, NotificationError> {
        Ok(SmtpTransport::relay(&self.server)
            .map_err(|e| NotificationError::Smtp(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    async fn send(
        &self,
        to: &str,
        subject: String,
        html_body: String,
    ) -> Result<(), NotificationError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| NotificationError::InvalidAddress(format!("from: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotificationError::InvalidAddress(format!("to {to}: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        let mailer = self.build_transport()?;
        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| NotificationError::Smtp(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::Smtp(format!("send task failed: {e}")))??;
        Ok(())
    }

    fn items_table(items: &[request_item::Model]) -> String {
        let mut rows = String::new();
        for item in items {
            rows.push_str(&format!(
                "<tr><td style=\"padding: 8px;\">{}</td>\
                 <td style=\"padding: 8px;\">{}</td>\
                 <td style=\"padding: 8px;\">{}</td></tr>\n",
                item.component_id, item.component_description, item.quantity_requested
            ));
        }
        format!(
            "<table border=\"1\" style=\"width:100%; border-collapse: collapse;\">\
             <thead><tr style=\"background-color:#f2f2f2;\">\
             <th style=\"padding: 8px; text-align: left;\">Component</th>\
             <th style=\"padding: 8px; text-align: left;\">Description</th>\
             <th style=\"padding: 8px; text-align: left;\">Quantity</th>\
             </tr></thead><tbody>{rows}</tbody></table>"
        )
    }

    fn request_summary(request: &request::Model) -> String {
        format!(
            "<ul>\
             <li><strong>Created:</strong> {}</li>\
             <li><strong>Requester:</strong> {} ({})</li>\
             <li><strong>Customer:</strong> {} ({})</li>\
             <li><strong>Sale order:</strong> {}</li>\
             <li><strong>Equipment:</strong> {} ({})</li>\
             <li><strong>Cost center:</strong> {} ({})</li>\
             </ul>",
            request.created_at.format("%Y-%m-%d %H:%M"),
            request.requester,
            request.requester_email.as_deref().unwrap_or("no email"),
            request.customer_name,
            request.customer_id,
            request.sale_order,
            request.equipment_name,
            request.equipment_id,
            request.cost_center_code,
            request.cost_center_sector.as_deref().unwrap_or("unknown"),
        )
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_manager_pending_approval(
        &self,
        manager_email: &str,
        request: &request::Model,
        items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        let link = format!(
            "{}?page=approvals&request_id={}",
            self.app_base_url, request.id
        );
        let html = format!(
            "<html><body>\
             <p>A new parts request is <strong>pending your approval</strong>.</p>\
             <h3>Request #{id}</h3>{summary}\
             <h4>Requested components</h4>{table}\
             <p><a href=\"{link}\">Open the request</a></p>\
             </body></html>",
            id = request.id,
            summary = Self::request_summary(request),
            table = Self::items_table(items),
        );
        self.send(
            manager_email,
            format!("Parts request #{} pending approval", request.id),
            html,
        )
        .await?;
        info!(request_id = request.id, to = %manager_email, "Manager notified of pending approval");
        Ok(())
    }

    async fn notify_warehouse_approved(
        &self,
        request: &request::Model,
        items: &[request_item::Model],
    ) -> Result<(), NotificationError> {
        let link = format!(
            "{}?page=warehouse_release&request_id={}",
            self.app_base_url, request.id
        );
        let html = format!(
            "<html><body>\
             <p>Parts request #{id} was <strong>approved</strong> and awaits release.</p>\
             {summary}\
             <h4>Requested components</h4>{table}\
             <p><a href=\"{link}\">Open the release screen</a></p>\
             </body></html>",
            id = request.id,
            summary = Self::request_summary(request),
            table = Self::items_table(items),
        );
        self.send(
            &self.warehouse_email,
            format!("Parts request #{} approved, awaiting release", request.id),
            html,
        )
        .await?;
        info!(request_id = request.id, "Warehouse notified of approved request");
        Ok(())
    }
}
