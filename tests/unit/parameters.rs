#[cfg(test)]
mod tests {
    use super::super::*;

    fn url_param(input: &str) -> Option<Parameter> {
        from_url(&Url::parse(input).unwrap(), None)
    }

    #[test]
    fn trim_keeps_the_suspicious_core_of_a_path() {
        let cases: &[(&str, &str)] = &[
            ("hello", ""),
            ("watch/video", ""),
            ("subdir/index_en.php", ""),
            ("search/<script>/puppa.html", "<script>"),
            (
                "page/'\"><script>alert(1)</script>/44/",
                "'\"><script>alert(1)</script>",
            ),
            (
                "/pages/static/<script>alert(2)/fake/</script>/index.html",
                "<script>alert(2)/fake/</script>",
            ),
            ("a=b", "="),
            ("/src/file_depot/mozilla-central/b.php", ""),
        ];
        for &(input, expected) in cases {
            assert_eq!(
                trim_to_suspicious(input, " -/.;", 0),
                expected,
                "input: {input}"
            );
        }
    }

    #[test]
    fn trim_flags_can_pin_either_boundary() {
        assert_eq!(
            trim_to_suspicious("aa<script>aa", "", LEAVE_BEG),
            "aa<script>"
        );
        assert_eq!(
            trim_to_suspicious("aa<script>aa", "", LEAVE_END),
            "<script>aa"
        );
        assert_eq!(
            trim_to_suspicious("aa<script>aa", "", LEAVE_BEG | LEAVE_END),
            "aa<script>aa"
        );
    }

    #[test]
    fn benign_urls_produce_no_parameter() {
        assert_eq!(url_param("http://www.a.com"), None);
        assert_eq!(url_param("http://www.a.com/index.php?a=3"), None);
        assert_eq!(url_param("http://www.a.com/dir/adf_en.html?a=4#hi"), None);
    }

    #[test]
    fn suspicious_query_yields_the_whole_reassembled_request() {
        let param =
            url_param("http://www.a.com/index.php?a=3&b=aaaaa&df=<script>xss()</script>").unwrap();
        assert_eq!(param.name, ParameterName::Url);
        assert_eq!(param.value, "index.php?a=3&b=aaaaa&df=<script>xss()</script>");
        assert!(param.dangerous);
        assert!(param.special);
    }

    #[test]
    fn fragment_is_included_in_the_parameter() {
        let param =
            url_param("http://www.a.com/index.php?a=3&b=<script>alert(1)</script>#hello").unwrap();
        assert_eq!(
            param.value,
            "index.php?a=3&b=<script>alert(1)</script>#hello"
        );
    }

    #[test]
    fn suspicious_path_and_fragment_are_both_caught() {
        let param =
            url_param("http://www.a.com/dir/<script>/index.php?param_1=<script>#<hello>aa")
                .unwrap();
        assert_eq!(
            param.value,
            "dir/<script>/index.php?param_1=<script>#<hello>aa"
        );
    }

    #[test]
    fn path_parameters_survive_extraction() {
        let param = url_param("http://www.a.com/index.php;param<script>param").unwrap();
        assert_eq!(param.value, "index.php;param<script>param");
    }

    #[test]
    fn urlencoded_post_body_is_decoded_and_trimmed() {
        let param = from_post_body(
            "a=3&b=%3Cscript%3Ealert(1)%3C%2Fscript%3E&c=hello+world",
            "application/x-www-form-urlencoded",
            None,
        )
        .unwrap();
        assert_eq!(param.name, ParameterName::Post);
        assert_eq!(param.value, "<script>alert(1)</script>");
        assert!(param.dangerous);
    }

    #[test]
    fn benign_urlencoded_post_body_produces_no_parameter() {
        assert_eq!(
            from_post_body(
                "a=3&b=hello+world",
                "application/x-www-form-urlencoded",
                None
            ),
            None
        );
    }

    #[test]
    fn multipart_post_body_is_taken_raw() {
        let body = "--boundary\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n\
                    <script>alert(1)</script>\r\n--boundary--\r\n";
        let param = from_post_body(body, "multipart/form-data; boundary=boundary", None).unwrap();
        assert_eq!(param.name, ParameterName::MultipartPost);
        assert_eq!(param.value, body);

        assert_eq!(from_post_body("", "multipart/form-data", None), None);
    }

    #[test]
    fn unsupported_post_content_types_are_skipped() {
        assert_eq!(
            from_post_body("<script>alert(1)</script>", "text/plain", None),
            None
        );
        assert_eq!(from_post_body("<script>alert(1)</script>", "", None), None);
    }

    #[test]
    fn from_parts_collects_url_and_post_parameters() {
        let url =
            Url::parse("http://www.a.com/index.php?q=<script>alert('xss')</script>").unwrap();
        let body = PostBody {
            content_type: "application/x-www-form-urlencoded".to_owned(),
            body: "comment=%3Cimg%20onerror%3Dalert(1)%3E".to_owned(),
        };
        let set = ParameterSet::from_parts(&url, Some(&body), None);
        assert_eq!(set.len(), 2);
        let names: Vec<_> = set.iter().map(|p| p.name).collect();
        assert_eq!(names, vec![ParameterName::Url, ParameterName::Post]);
    }

    #[test]
    fn parameter_names_render_like_report_labels() {
        assert_eq!(ParameterName::Url.to_string(), "URL");
        assert_eq!(ParameterName::Post.to_string(), "POST");
        assert_eq!(ParameterName::MultipartPost.to_string(), "MIMEPOST");
    }
}
