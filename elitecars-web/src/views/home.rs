use super::{layout, PageContext};

pub fn index(ctx: &PageContext) -> String {
    let content = r##"<div class="p-5 mb-4 bg-white rounded-3 shadow-sm">
        <h1 class="display-5 fw-bold">EliteCars</h1>
        <p class="fs-5">Hand-picked vehicles, honest descriptions, quick answers.</p>
        <a class="btn btn-primary btn-lg" href="/cars">Browse cars</a>
        <a class="btn btn-outline-secondary btn-lg" href="/inquiries/mine">Track my inquiries</a>
    </div>"##;
    layout("Home", ctx, content)
}

pub fn user_view(ctx: &PageContext) -> String {
    let content = r##"<h1 class="h3">Welcome</h1>
    <p>Find a car you like and send us an inquiry from its details page.
    You can follow up on your inquiries any time with the email address you used.</p>
    <a class="btn btn-primary" href="/cars">See all cars</a>"##;
    layout("Welcome", ctx, content)
}

pub fn admin_view(ctx: &PageContext) -> String {
    let content = r##"<h1 class="h3">Admin dashboard</h1>
    <div class="row g-3">
        <div class="col-md-4"><a class="btn btn-outline-primary w-100" href="/cars">Manage cars</a></div>
        <div class="col-md-4"><a class="btn btn-outline-primary w-100" href="/cars/create">Add a car</a></div>
        <div class="col-md-4"><a class="btn btn-outline-primary w-100" href="/inquiries">Answer inquiries</a></div>
    </div>"##;
    layout("Dashboard", ctx, content)
}
