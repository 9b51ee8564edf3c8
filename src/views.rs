// src/views.rs
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::models::User;

pub const NOTICE_COOKIE: &str = "notice";

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn notice_cookie(notice: &str) -> Cookie<'static> {
    Cookie::build(NOTICE_COOKIE, urlencoding::encode(notice).into_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn redirect_with_notice(location: &str, notice: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .cookie(notice_cookie(notice))
        .finish()
}

/// Reads the one-shot notice left by the previous redirect.
pub fn take_notice(req: &HttpRequest) -> Option<String> {
    req.cookie(NOTICE_COOKIE)
        .and_then(|c| urlencoding::decode(c.value()).ok().map(|v| v.into_owned()))
        .filter(|v| !v.is_empty())
}

/// Renders an HTML page, clearing the notice cookie once it has been shown.
pub fn page(body: String, notice_shown: bool) -> HttpResponse {
    let mut resp = HttpResponse::Ok();
    resp.content_type("text/html; charset=utf-8");
    if notice_shown {
        let mut removal = Cookie::build(NOTICE_COOKIE, "").path("/").finish();
        removal.make_removal();
        resp.cookie(removal);
    }
    resp.body(body)
}

fn layout(title: &str, notice: Option<&str>, content: &str) -> String {
    let notice = notice
        .map(|n| format!("<p class=\"notice\">{}</p>", text(n)))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body>{}{}</body></html>",
        text(title),
        notice,
        content
    )
}

pub fn login_page(notice: Option<&str>) -> String {
    layout(
        "Login",
        notice,
        "<h1>Login</h1>\
         <form method=\"post\" action=\"/login\">\
         <input name=\"username\" placeholder=\"Username\" required>\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\
         <button type=\"submit\">Login</button></form>\
         <p><a href=\"/register\">Create an account</a></p>",
    )
}

pub fn register_page(notice: Option<&str>) -> String {
    layout(
        "Register",
        notice,
        "<h1>Register</h1>\
         <form method=\"post\" action=\"/register\">\
         <input name=\"username\" placeholder=\"Username\" required>\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\
         <input name=\"email\" type=\"email\" placeholder=\"Email\">\
         <input name=\"phone\" placeholder=\"Phone number\">\
         <button type=\"submit\">Register</button></form>\
         <p><a href=\"/login\">Already registered?</a></p>",
    )
}

pub fn index_page(username: &str, is_admin: bool, notice: Option<&str>) -> String {
    let admin_link = if is_admin {
        "<p><a href=\"/admin\">Admin console</a></p>"
    } else {
        ""
    };
    let content = format!(
        "<h1>Welcome, {}</h1>{}\
         <h2>BS to AD</h2>\
         <form method=\"post\" action=\"/convert_bs_to_ad\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\".xls,.xlsx\" required>\
         <button type=\"submit\">Convert</button></form>\
         <h2>AD to BS</h2>\
         <form method=\"post\" action=\"/convert_ad_to_bs\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\".xls,.xlsx\" required>\
         <button type=\"submit\">Convert</button></form>\
         <p><a href=\"/logout\">Logout</a></p>",
        text(username),
        admin_link
    );
    layout("Date converter", notice, &content)
}

pub fn trial_expired_page(qr: &str) -> String {
    let content = format!(
        "<h1>Your trial has expired</h1>\
         <p>Scan the QR code below to subscribe and keep converting.</p>\
         <img src=\"/static/{}\" alt=\"Payment QR code\">\
         <p><a href=\"/login\">Back to login</a></p>",
        attr(qr)
    );
    layout("Trial expired", None, &content)
}

pub fn admin_page(users: &[User], notice: Option<&str>) -> String {
    let mut rows = String::new();
    for user in users {
        let id = user.id;
        let toggle = if user.is_subscribed {
            format!("<a href=\"/admin/unsubscribe/{id}\">Unsubscribe</a>")
        } else {
            format!("<a href=\"/admin/subscribe/{id}\">Subscribe</a>")
        };
        rows.push_str(&format!(
            "<tr><td>{id}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td>\
             <td>{toggle} <a href=\"/admin/delete/{id}\">Delete</a>\
             <form method=\"post\" action=\"/admin/upload_qr/{id}\" enctype=\"multipart/form-data\">\
             <input type=\"file\" name=\"qr_file\" accept=\".png,.jpg,.jpeg\">\
             <button type=\"submit\">Upload QR</button></form></td></tr>",
            text(&user.username),
            text(user.email.as_deref().unwrap_or("")),
            text(user.phone_number.as_deref().unwrap_or("")),
            user.usage_count,
            if user.is_subscribed { "yes" } else { "no" },
            text(user.custom_qr.as_deref().unwrap_or("default")),
            user.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    let content = format!(
        "<h1>Admin console</h1>\
         <table><thead><tr><th>ID</th><th>Username</th><th>Email</th><th>Phone</th>\
         <th>Usage</th><th>Subscribed</th><th>QR</th><th>Created</th><th>Actions</th></tr></thead>\
         <tbody>{rows}</tbody></table>\
         <p><a href=\"/\">Converter</a> | <a href=\"/logout\">Logout</a></p>"
    );
    layout("Admin", notice, &content)
}
