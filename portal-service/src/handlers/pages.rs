//! Public pages.
//!
//! Presentation belongs to the portal frontend; this service only needs a
//! login target for gate redirects, so the page below is a minimal two-step
//! code form with no templating behind it.

use axum::response::Html;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Committee Portal - Sign in</title>
</head>
<body>
  <main style="max-width: 420px; margin: 10vh auto; font-family: sans-serif;">
    <h1>Committee Portal</h1>
    <p>Enter your committee email address and we will send you a sign-in code.</p>
    <form id="send-form">
      <input type="email" id="email" placeholder="you@example.org" required>
      <button type="submit">Send code</button>
    </form>
    <form id="verify-form" hidden>
      <input type="text" id="code" inputmode="numeric" maxlength="6" placeholder="6-digit code" required>
      <button type="submit">Sign in</button>
    </form>
    <p id="message"></p>
  </main>
  <script>
    const message = document.getElementById("message");

    async function post(url, body) {
      const res = await fetch(url, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
      const data = await res.json().catch(() => ({}));
      if (!res.ok) throw new Error(data.error || "Something went wrong");
      return data;
    }

    document.getElementById("send-form").addEventListener("submit", async (e) => {
      e.preventDefault();
      try {
        await post("/api/auth/send-code", { email: email.value });
        document.getElementById("verify-form").hidden = false;
        message.textContent = "Check your inbox for the code.";
      } catch (err) {
        message.textContent = err.message;
      }
    });

    document.getElementById("verify-form").addEventListener("submit", async (e) => {
      e.preventDefault();
      try {
        await post("/api/auth/verify-code", { email: email.value, code: code.value });
        window.location.href = "/";
      } catch (err) {
        message.textContent = err.message;
      }
    });
  </script>
</body>
</html>
"#;

/// GET /login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}
