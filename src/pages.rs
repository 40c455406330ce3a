//! Static HTML for the public pages.

pub const HOME: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Tasklist</title></head>
<body>
  <h1>Tasklist</h1>
  <p>Keep track of what needs doing.</p>
  <p><a href="/register">Register</a> or <a href="/login">log in</a>.</p>
</body>
</html>
"#;

pub const LOGIN: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Log in</title></head>
<body>
  <h1>Log in</h1>
  <form action="/login" method="post">
    <label>Email <input type="email" name="email" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Log in</button>
  </form>
  <p><a href="/auth/google">Sign in with Google</a></p>
  <p><a href="/auth/github">Sign in with GitHub</a></p>
  <p>No account yet? <a href="/register">Register</a></p>
</body>
</html>
"#;

pub const REGISTER: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Register</title></head>
<body>
  <h1>Register</h1>
  <form action="/register" method="post">
    <label>Name <input type="text" name="name" required></label>
    <label>Email <input type="email" name="email" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Register</button>
  </form>
  <p><a href="/auth/google">Sign up with Google</a></p>
  <p><a href="/auth/github">Sign up with GitHub</a></p>
</body>
</html>
"#;
