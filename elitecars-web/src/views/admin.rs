use super::{escape, layout, PageContext};

/// Login form; submission goes through `fetch` because the endpoint answers JSON.
pub fn login_page(ctx: &PageContext, return_url: Option<&str>) -> String {
    let return_input = return_url
        .map(|url| {
            format!(
                r#"<input type="hidden" name="returnUrl" value="{}">"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    let content = format!(
        r##"<div class="row justify-content-center">
    <div class="col-md-5">
        <h1 class="h3 mb-3">Admin login</h1>
        <div id="login-error" class="alert alert-danger d-none" role="alert"></div>
        <form id="login-form" method="post" action="/admin/login">
            {return_input}
            <div class="mb-3">
                <label class="form-label" for="username">Username</label>
                <input class="form-control" id="username" name="username" autocomplete="username" required>
            </div>
            <div class="mb-3">
                <label class="form-label" for="password">Password</label>
                <input class="form-control" id="password" name="password" type="password" autocomplete="current-password" required>
            </div>
            <button type="submit" class="btn btn-primary w-100">Log in</button>
        </form>
    </div>
</div>
<script>
document.getElementById('login-form').addEventListener('submit', async (event) => {{
    event.preventDefault();
    const form = event.target;
    const response = await fetch(form.action, {{
        method: 'POST',
        body: new URLSearchParams(new FormData(form)),
        credentials: 'same-origin'
    }});
    const result = await response.json();
    if (result.success) {{
        window.location.href = result.returnUrl || '/home/admin';
        return;
    }}
    const box = document.getElementById('login-error');
    box.textContent = result.message;
    box.classList.remove('d-none');
}});
</script>"##
    );
    layout("Admin login", ctx, &content)
}
